//! Content module - immutable lookup tables for everything data-driven
//!
//! Chains, generators, orders, rooms, letters, episodes and branch moments
//! are bundled into the crate (see [`crate::catalog`]) and indexed here.
//! The repository validates every cross-reference once at construction;
//! after that, a failed lookup means the caller holds an id that never
//! existed, which is a data bug and surfaces as a [`ContentError`].

use std::collections::HashMap;

use merge_manor_types::{ChainId, LetterMood, OrderType, MAX_TIER};
use thiserror::Error;

/// Fatal content-lookup failure. Domain rules never produce these; an
/// unknown id can only come from corrupted state or a broken table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("unknown item id: {0}")]
    UnknownItem(String),
    #[error("unknown chain id: {0}")]
    UnknownChain(String),
    #[error("unknown order id: {0}")]
    UnknownOrder(String),
    #[error("unknown room id: {0}")]
    UnknownRoom(String),
    #[error("unknown letter id: {0}")]
    UnknownLetter(String),
    #[error("unknown branch moment id: {0}")]
    UnknownBranchMoment(String),
    #[error("unknown generator id: {0}")]
    UnknownGenerator(String),
    #[error("invalid content table: {0}")]
    Invalid(String),
}

/// One tier of an item chain
#[derive(Debug, Clone)]
pub struct ItemTierDef {
    pub id: &'static str,
    pub tier: u8,
    pub name: &'static str,
}

/// A family of items sharing a progression across 8 tiers
#[derive(Debug, Clone)]
pub struct ItemChainDef {
    pub id: ChainId,
    pub name: &'static str,
    pub tiers: Vec<ItemTierDef>,
}

#[derive(Debug, Clone)]
pub struct GeneratorDropDef {
    pub item_id: &'static str,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub struct GeneratorLevelDef {
    pub level: u32,
    pub cooldown_sec: u64,
    pub drops: Vec<GeneratorDropDef>,
}

/// A resource generator the player taps to spawn items
#[derive(Debug, Clone)]
pub struct GeneratorDef {
    pub id: &'static str,
    pub name: &'static str,
    pub levels: Vec<GeneratorLevelDef>,
}

/// Chain + minimum tier + count tuple an order asks for
#[derive(Debug, Clone, Copy)]
pub struct OrderRequirementDef {
    pub chain: ChainId,
    pub tier: u8,
    pub count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderRewardDef {
    pub coins: u32,
    pub stars: u32,
    pub xp: u32,
}

#[derive(Debug, Clone)]
pub struct OrderDef {
    pub id: &'static str,
    pub order_type: OrderType,
    pub title: &'static str,
    /// Timed orders expire and reroll after this many seconds
    pub timed_seconds: Option<u64>,
    pub min_player_level: u32,
    pub max_player_level: u32,
    pub requirements: Vec<OrderRequirementDef>,
    pub rewards: OrderRewardDef,
    pub trigger_letter_id: Option<&'static str>,
    pub trigger_branch_moment_id: Option<&'static str>,
}

impl OrderDef {
    /// Easy orders never ask for anything above tier 3
    pub fn is_easy(&self) -> bool {
        self.requirements.iter().all(|req| req.tier <= 3)
    }
}

#[derive(Debug, Clone)]
pub struct RoomStyleDef {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone)]
pub struct RoomDef {
    pub id: &'static str,
    pub name: &'static str,
    pub unlocked_at_episode: u32,
    pub styles: Vec<RoomStyleDef>,
}

/// Body text supports `{player_name}`, `{room_name}`, `{decor_choice}` and
/// `{episode_number}` placeholders, filled in when the letter is delivered.
#[derive(Debug, Clone)]
pub struct LetterDef {
    pub id: &'static str,
    pub title: &'static str,
    pub body: &'static str,
    pub mood: LetterMood,
}

#[derive(Debug, Clone)]
pub struct EpisodeStepDef {
    pub id: &'static str,
    pub description: &'static str,
    /// Named player action that completes this step
    pub required_action: &'static str,
}

#[derive(Debug, Clone)]
pub struct EpisodeDef {
    pub id: u32,
    pub name: &'static str,
    pub unlock_room_id: Option<&'static str>,
    pub steps: Vec<EpisodeStepDef>,
}

/// One side of a narrative fork
#[derive(Debug, Clone)]
pub struct BranchOptionDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub decor_flag: &'static str,
    pub letter_id: &'static str,
}

/// A narrative fork opened by placing an echo item on the echo zone
#[derive(Debug, Clone)]
pub struct BranchMomentDef {
    pub id: &'static str,
    pub room_id: &'static str,
    pub option_a: BranchOptionDef,
    pub option_b: BranchOptionDef,
}

#[derive(Debug, Clone)]
pub struct IapSkuDef {
    pub id: &'static str,
    pub display_name: &'static str,
    pub price_text: &'static str,
    pub coins: u32,
    pub stars: u32,
    pub gems: u32,
    pub energy: u32,
}

/// Read-only, validated content tables with id-indexed access
#[derive(Debug)]
pub struct ContentRepository {
    chains: Vec<ItemChainDef>,
    generators: Vec<GeneratorDef>,
    orders: Vec<OrderDef>,
    rooms: Vec<RoomDef>,
    letters: Vec<LetterDef>,
    episodes: Vec<EpisodeDef>,
    branch_moments: Vec<BranchMomentDef>,
    iap_catalog: Vec<IapSkuDef>,
    // (chain index, tier index) per item id
    item_index: HashMap<&'static str, (usize, usize)>,
    order_index: HashMap<&'static str, usize>,
    room_index: HashMap<&'static str, usize>,
    letter_index: HashMap<&'static str, usize>,
    branch_index: HashMap<&'static str, usize>,
    generator_index: HashMap<&'static str, usize>,
}

impl ContentRepository {
    /// Build a repository from the bundled default tables
    pub fn bundled() -> Self {
        Self::new(
            crate::catalog::chains(),
            crate::catalog::generators(),
            crate::catalog::orders(),
            crate::catalog::rooms(),
            crate::catalog::letters(),
            crate::catalog::episodes(),
            crate::catalog::branch_moments(),
            crate::catalog::iap_catalog(),
        )
        .expect("bundled content tables must validate")
    }

    /// Build and validate a repository from explicit tables
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chains: Vec<ItemChainDef>,
        generators: Vec<GeneratorDef>,
        orders: Vec<OrderDef>,
        rooms: Vec<RoomDef>,
        letters: Vec<LetterDef>,
        episodes: Vec<EpisodeDef>,
        branch_moments: Vec<BranchMomentDef>,
        iap_catalog: Vec<IapSkuDef>,
    ) -> Result<Self, ContentError> {
        let mut repo = Self {
            chains,
            generators,
            orders,
            rooms,
            letters,
            episodes,
            branch_moments,
            iap_catalog,
            item_index: HashMap::new(),
            order_index: HashMap::new(),
            room_index: HashMap::new(),
            letter_index: HashMap::new(),
            branch_index: HashMap::new(),
            generator_index: HashMap::new(),
        };
        repo.build_indexes()?;
        repo.validate()?;
        Ok(repo)
    }

    fn build_indexes(&mut self) -> Result<(), ContentError> {
        for (chain_idx, chain) in self.chains.iter().enumerate() {
            for (tier_idx, tier) in chain.tiers.iter().enumerate() {
                if self
                    .item_index
                    .insert(tier.id, (chain_idx, tier_idx))
                    .is_some()
                {
                    return Err(ContentError::Invalid(format!(
                        "duplicate item id {}",
                        tier.id
                    )));
                }
            }
        }
        for (idx, order) in self.orders.iter().enumerate() {
            self.order_index.insert(order.id, idx);
        }
        for (idx, room) in self.rooms.iter().enumerate() {
            self.room_index.insert(room.id, idx);
        }
        for (idx, letter) in self.letters.iter().enumerate() {
            self.letter_index.insert(letter.id, idx);
        }
        for (idx, branch) in self.branch_moments.iter().enumerate() {
            self.branch_index.insert(branch.id, idx);
        }
        for (idx, generator) in self.generators.iter().enumerate() {
            self.generator_index.insert(generator.id, idx);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ContentError> {
        for chain in &self.chains {
            if chain.tiers.len() != MAX_TIER as usize {
                return Err(ContentError::Invalid(format!(
                    "chain {} has {} tiers, expected {}",
                    chain.id.as_str(),
                    chain.tiers.len(),
                    MAX_TIER
                )));
            }
            for (index, tier) in chain.tiers.iter().enumerate() {
                if tier.tier as usize != index + 1 {
                    return Err(ContentError::Invalid(format!(
                        "chain {} tier sequence broken at {}",
                        chain.id.as_str(),
                        tier.id
                    )));
                }
            }
        }
        for generator in &self.generators {
            if generator.levels.is_empty() {
                return Err(ContentError::Invalid(format!(
                    "generator {} has no levels",
                    generator.id
                )));
            }
            for level in &generator.levels {
                if level.drops.is_empty() {
                    return Err(ContentError::Invalid(format!(
                        "generator {} level {} has no drops",
                        generator.id, level.level
                    )));
                }
                for drop in &level.drops {
                    self.item(drop.item_id)?;
                }
            }
        }
        for order in &self.orders {
            if order.requirements.is_empty() {
                return Err(ContentError::Invalid(format!(
                    "order {} has no requirements",
                    order.id
                )));
            }
            if let Some(letter_id) = order.trigger_letter_id {
                self.letter(letter_id)?;
            }
            if let Some(branch_id) = order.trigger_branch_moment_id {
                self.branch_moment(branch_id)?;
            }
        }
        for branch in &self.branch_moments {
            let room = self.room(branch.room_id)?;
            for option in [&branch.option_a, &branch.option_b] {
                self.letter(option.letter_id)?;
                if !room.styles.iter().any(|style| style.id == option.id) {
                    return Err(ContentError::Invalid(format!(
                        "branch {} option {} has no matching style in room {}",
                        branch.id, option.id, room.id
                    )));
                }
            }
        }
        for episode in &self.episodes {
            if let Some(room_id) = episode.unlock_room_id {
                self.room(room_id)?;
            }
        }
        Ok(())
    }

    pub fn item(&self, item_id: &str) -> Result<&ItemTierDef, ContentError> {
        self.item_index
            .get(item_id)
            .map(|&(chain_idx, tier_idx)| &self.chains[chain_idx].tiers[tier_idx])
            .ok_or_else(|| ContentError::UnknownItem(item_id.to_string()))
    }

    pub fn chain_of_item(&self, item_id: &str) -> Result<&ItemChainDef, ContentError> {
        self.item_index
            .get(item_id)
            .map(|&(chain_idx, _)| &self.chains[chain_idx])
            .ok_or_else(|| ContentError::UnknownItem(item_id.to_string()))
    }

    pub fn chain(&self, chain_id: ChainId) -> Result<&ItemChainDef, ContentError> {
        self.chains
            .iter()
            .find(|chain| chain.id == chain_id)
            .ok_or_else(|| ContentError::UnknownChain(chain_id.as_str().to_string()))
    }

    /// Next-tier item of the same chain, or `None` at the terminal tier
    pub fn next_tier_item(&self, item_id: &str) -> Result<Option<&'static str>, ContentError> {
        let &(chain_idx, tier_idx) = self
            .item_index
            .get(item_id)
            .ok_or_else(|| ContentError::UnknownItem(item_id.to_string()))?;
        Ok(self.chains[chain_idx]
            .tiers
            .get(tier_idx + 1)
            .map(|tier| tier.id))
    }

    pub fn order(&self, order_id: &str) -> Result<&OrderDef, ContentError> {
        self.order_index
            .get(order_id)
            .map(|&idx| &self.orders[idx])
            .ok_or_else(|| ContentError::UnknownOrder(order_id.to_string()))
    }

    pub fn room(&self, room_id: &str) -> Result<&RoomDef, ContentError> {
        self.room_index
            .get(room_id)
            .map(|&idx| &self.rooms[idx])
            .ok_or_else(|| ContentError::UnknownRoom(room_id.to_string()))
    }

    pub fn letter(&self, letter_id: &str) -> Result<&LetterDef, ContentError> {
        self.letter_index
            .get(letter_id)
            .map(|&idx| &self.letters[idx])
            .ok_or_else(|| ContentError::UnknownLetter(letter_id.to_string()))
    }

    pub fn branch_moment(&self, branch_id: &str) -> Result<&BranchMomentDef, ContentError> {
        self.branch_index
            .get(branch_id)
            .map(|&idx| &self.branch_moments[idx])
            .ok_or_else(|| ContentError::UnknownBranchMoment(branch_id.to_string()))
    }

    pub fn generator(&self, generator_id: &str) -> Result<&GeneratorDef, ContentError> {
        self.generator_index
            .get(generator_id)
            .map(|&idx| &self.generators[idx])
            .ok_or_else(|| ContentError::UnknownGenerator(generator_id.to_string()))
    }

    pub fn chains(&self) -> &[ItemChainDef] {
        &self.chains
    }

    pub fn orders(&self) -> &[OrderDef] {
        &self.orders
    }

    pub fn rooms(&self) -> &[RoomDef] {
        &self.rooms
    }

    pub fn episodes(&self) -> &[EpisodeDef] {
        &self.episodes
    }

    pub fn branch_moments(&self) -> &[BranchMomentDef] {
        &self.branch_moments
    }

    pub fn iap_catalog(&self) -> &[IapSkuDef] {
        &self.iap_catalog
    }
}

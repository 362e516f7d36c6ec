//! Bundled default content tables
//!
//! The in-code analog of the source data files: every chain, generator,
//! order, room, letter, episode, branch moment and store SKU the game ships
//! with. [`crate::content::ContentRepository::bundled`] indexes and
//! validates these at startup.

use merge_manor_types::{ChainId, LetterMood, OrderType};

use crate::content::{
    BranchMomentDef, BranchOptionDef, EpisodeDef, EpisodeStepDef, GeneratorDef, GeneratorDropDef,
    GeneratorLevelDef, IapSkuDef, ItemChainDef, ItemTierDef, LetterDef, OrderDef,
    OrderRequirementDef, OrderRewardDef, RoomDef, RoomStyleDef,
};

fn chain(id: ChainId, name: &'static str, names: [&'static str; 8], prefix: &'static str) -> ItemChainDef {
    let ids: [&'static str; 8] = match prefix {
        "wood" => [
            "wood_1", "wood_2", "wood_3", "wood_4", "wood_5", "wood_6", "wood_7", "wood_8",
        ],
        "ocean" => [
            "ocean_1", "ocean_2", "ocean_3", "ocean_4", "ocean_5", "ocean_6", "ocean_7", "ocean_8",
        ],
        "food" => [
            "food_1", "food_2", "food_3", "food_4", "food_5", "food_6", "food_7", "food_8",
        ],
        "tech" => [
            "tech_1", "tech_2", "tech_3", "tech_4", "tech_5", "tech_6", "tech_7", "tech_8",
        ],
        _ => unreachable!("unknown chain prefix"),
    };
    ItemChainDef {
        id,
        name,
        tiers: ids
            .iter()
            .zip(names.iter())
            .enumerate()
            .map(|(index, (&id, &name))| ItemTierDef {
                id,
                tier: (index + 1) as u8,
                name,
            })
            .collect(),
    }
}

pub fn chains() -> Vec<ItemChainDef> {
    vec![
        chain(
            ChainId::Woodworking,
            "Woodworking",
            [
                "Twig Bundle",
                "Rough Plank",
                "Footstool",
                "Carved Chair",
                "Dining Table",
                "Oak Wardrobe",
                "Parlor Suite",
                "Heirloom Cabinet",
            ],
            "wood",
        ),
        chain(
            ChainId::Oceanic,
            "Oceanic",
            [
                "Sea Glass",
                "Spiral Shell",
                "Coral Sprig",
                "Tide-Pool Jar",
                "Ship Lantern",
                "Brass Compass",
                "Captain's Chest",
                "Lighthouse Lens",
            ],
            "ocean",
        ),
        chain(
            ChainId::Culinary,
            "Culinary",
            [
                "Herb Sprig",
                "Fresh Dough",
                "Crusty Loaf",
                "Berry Pie",
                "Roast Platter",
                "Tiered Cake",
                "Banquet Spread",
                "Feast of the Manor",
            ],
            "food",
        ),
        chain(
            ChainId::Tech,
            "Tech",
            [
                "Loose Gear",
                "Wound Spring",
                "Clockwork Core",
                "Brass Gauge",
                "Music Box",
                "Grand Clock",
                "Orrery",
                "Wondrous Automaton",
            ],
            "tech",
        ),
    ]
}

pub fn generators() -> Vec<GeneratorDef> {
    vec![
        GeneratorDef {
            id: "toolbox",
            name: "Dusty Toolbox",
            levels: vec![
                GeneratorLevelDef {
                    level: 1,
                    cooldown_sec: 30,
                    drops: vec![
                        GeneratorDropDef { item_id: "wood_1", weight: 6.0 },
                        GeneratorDropDef { item_id: "tech_1", weight: 3.0 },
                        GeneratorDropDef { item_id: "wood_2", weight: 1.0 },
                    ],
                },
                GeneratorLevelDef {
                    level: 2,
                    cooldown_sec: 120,
                    drops: vec![
                        GeneratorDropDef { item_id: "wood_1", weight: 5.0 },
                        GeneratorDropDef { item_id: "tech_1", weight: 3.0 },
                        GeneratorDropDef { item_id: "wood_2", weight: 2.0 },
                        GeneratorDropDef { item_id: "tech_2", weight: 1.0 },
                    ],
                },
                GeneratorLevelDef {
                    level: 3,
                    cooldown_sec: 300,
                    drops: vec![
                        GeneratorDropDef { item_id: "wood_2", weight: 4.0 },
                        GeneratorDropDef { item_id: "tech_2", weight: 3.0 },
                        GeneratorDropDef { item_id: "wood_3", weight: 1.0 },
                    ],
                },
            ],
        },
        GeneratorDef {
            id: "pantry",
            name: "Stocked Pantry",
            levels: vec![
                GeneratorLevelDef {
                    level: 1,
                    cooldown_sec: 30,
                    drops: vec![
                        GeneratorDropDef { item_id: "food_1", weight: 6.0 },
                        GeneratorDropDef { item_id: "ocean_1", weight: 3.0 },
                        GeneratorDropDef { item_id: "food_2", weight: 1.0 },
                    ],
                },
                GeneratorLevelDef {
                    level: 2,
                    cooldown_sec: 120,
                    drops: vec![
                        GeneratorDropDef { item_id: "food_1", weight: 5.0 },
                        GeneratorDropDef { item_id: "ocean_1", weight: 3.0 },
                        GeneratorDropDef { item_id: "food_2", weight: 2.0 },
                        GeneratorDropDef { item_id: "ocean_2", weight: 1.0 },
                    ],
                },
                GeneratorLevelDef {
                    level: 3,
                    cooldown_sec: 300,
                    drops: vec![
                        GeneratorDropDef { item_id: "food_2", weight: 4.0 },
                        GeneratorDropDef { item_id: "ocean_2", weight: 3.0 },
                        GeneratorDropDef { item_id: "food_3", weight: 1.0 },
                    ],
                },
            ],
        },
    ]
}

pub fn orders() -> Vec<OrderDef> {
    vec![
        OrderDef {
            id: "welcome_repairs",
            order_type: OrderType::RepairCraftOrder,
            title: "Welcome Repairs",
            timed_seconds: None,
            min_player_level: 1,
            max_player_level: 5,
            requirements: vec![OrderRequirementDef { chain: ChainId::Woodworking, tier: 1, count: 2 }],
            rewards: OrderRewardDef { coins: 30, stars: 5, xp: 40 },
            trigger_letter_id: Some("hall_first_order"),
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "kindling_request",
            order_type: OrderType::CookingOrder,
            title: "Kindling Request",
            timed_seconds: None,
            min_player_level: 1,
            max_player_level: 6,
            requirements: vec![OrderRequirementDef { chain: ChainId::Culinary, tier: 1, count: 3 }],
            rewards: OrderRewardDef { coins: 35, stars: 5, xp: 45 },
            trigger_letter_id: None,
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "tidy_the_hall",
            order_type: OrderType::RenovationOrder,
            title: "Tidy the Hall",
            timed_seconds: None,
            min_player_level: 1,
            max_player_level: 8,
            requirements: vec![
                OrderRequirementDef { chain: ChainId::Woodworking, tier: 2, count: 1 },
                OrderRequirementDef { chain: ChainId::Tech, tier: 1, count: 1 },
            ],
            rewards: OrderRewardDef { coins: 50, stars: 8, xp: 60 },
            trigger_letter_id: None,
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "fresh_catch",
            order_type: OrderType::GuestOrder,
            title: "Fresh Catch",
            timed_seconds: Some(1800),
            min_player_level: 1,
            max_player_level: 10,
            requirements: vec![OrderRequirementDef { chain: ChainId::Oceanic, tier: 2, count: 2 }],
            rewards: OrderRewardDef { coins: 70, stars: 10, xp: 70 },
            trigger_letter_id: None,
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "tea_for_two",
            order_type: OrderType::CookingOrder,
            title: "Tea for Two",
            timed_seconds: None,
            min_player_level: 2,
            max_player_level: 10,
            requirements: vec![OrderRequirementDef { chain: ChainId::Culinary, tier: 3, count: 1 }],
            rewards: OrderRewardDef { coins: 80, stars: 12, xp: 90 },
            trigger_letter_id: None,
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "workshop_vision",
            order_type: OrderType::RenovationOrder,
            title: "Workshop Vision",
            timed_seconds: None,
            min_player_level: 3,
            max_player_level: 14,
            requirements: vec![OrderRequirementDef { chain: ChainId::Woodworking, tier: 4, count: 1 }],
            rewards: OrderRewardDef { coins: 140, stars: 18, xp: 140 },
            trigger_letter_id: None,
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "chandelier_fix",
            order_type: OrderType::RepairCraftOrder,
            title: "Chandelier Fix",
            timed_seconds: None,
            min_player_level: 4,
            max_player_level: 16,
            requirements: vec![
                OrderRequirementDef { chain: ChainId::Tech, tier: 4, count: 1 },
                OrderRequirementDef { chain: ChainId::Woodworking, tier: 3, count: 1 },
            ],
            rewards: OrderRewardDef { coins: 180, stars: 22, xp: 170 },
            trigger_letter_id: None,
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "garden_mystery",
            order_type: OrderType::MysteryClueOrder,
            title: "Garden Mystery",
            timed_seconds: None,
            min_player_level: 5,
            max_player_level: 20,
            requirements: vec![OrderRequirementDef { chain: ChainId::Oceanic, tier: 5, count: 1 }],
            rewards: OrderRewardDef { coins: 260, stars: 30, xp: 220 },
            trigger_letter_id: None,
            trigger_branch_moment_id: Some("kitchen_modern_vintage"),
        },
        OrderDef {
            id: "banquet_prep",
            order_type: OrderType::CookingOrder,
            title: "Banquet Prep",
            timed_seconds: Some(3600),
            min_player_level: 6,
            max_player_level: 24,
            requirements: vec![
                OrderRequirementDef { chain: ChainId::Culinary, tier: 5, count: 1 },
                OrderRequirementDef { chain: ChainId::Culinary, tier: 3, count: 2 },
            ],
            rewards: OrderRewardDef { coins: 320, stars: 36, xp: 260 },
            trigger_letter_id: None,
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "curators_request",
            order_type: OrderType::DecorChoiceOrder,
            title: "The Curator's Request",
            timed_seconds: None,
            min_player_level: 8,
            max_player_level: 30,
            requirements: vec![OrderRequirementDef { chain: ChainId::Tech, tier: 6, count: 1 }],
            rewards: OrderRewardDef { coins: 450, stars: 48, xp: 320 },
            trigger_letter_id: Some("curator_hint"),
            trigger_branch_moment_id: None,
        },
        OrderDef {
            id: "grand_restoration",
            order_type: OrderType::RenovationOrder,
            title: "Grand Restoration",
            timed_seconds: None,
            min_player_level: 10,
            max_player_level: 40,
            requirements: vec![
                OrderRequirementDef { chain: ChainId::Woodworking, tier: 6, count: 1 },
                OrderRequirementDef { chain: ChainId::Oceanic, tier: 5, count: 1 },
            ],
            rewards: OrderRewardDef { coins: 600, stars: 60, xp: 400 },
            trigger_letter_id: None,
            trigger_branch_moment_id: None,
        },
    ]
}

pub fn rooms() -> Vec<RoomDef> {
    vec![
        RoomDef {
            id: "entrance_hall",
            name: "Entrance Hall",
            unlocked_at_episode: 1,
            styles: vec![
                RoomStyleDef { id: "classic_welcome", name: "Classic Welcome" },
                RoomStyleDef { id: "bright_welcome", name: "Bright Welcome" },
            ],
        },
        RoomDef {
            id: "kitchen",
            name: "Kitchen",
            unlocked_at_episode: 1,
            styles: vec![
                RoomStyleDef { id: "kitchen_modern", name: "Modern Kitchen" },
                RoomStyleDef { id: "kitchen_vintage", name: "Vintage Kitchen" },
            ],
        },
        RoomDef {
            id: "sunroom_garden",
            name: "Sunroom Garden",
            unlocked_at_episode: 2,
            styles: vec![
                RoomStyleDef { id: "sunroom_botanical", name: "Botanical Sunroom" },
                RoomStyleDef { id: "sunroom_minimal", name: "Minimal Sunroom" },
            ],
        },
        RoomDef {
            id: "library_study",
            name: "Library Study",
            unlocked_at_episode: 3,
            styles: vec![
                RoomStyleDef { id: "library_oak", name: "Oak Library" },
                RoomStyleDef { id: "library_velvet", name: "Velvet Library" },
            ],
        },
    ]
}

pub fn letters() -> Vec<LetterDef> {
    vec![
        LetterDef {
            id: "hall_first_order",
            title: "The Hall Remembers",
            body: "Dear {player_name},\n\nThe {room_name} already feels warmer. \
                   Keep mending what you find; the house notices.\n\n- E.",
            mood: LetterMood::Hopeful,
        },
        LetterDef {
            id: "curator_hint",
            title: "A Curator Calls",
            body: "{player_name},\n\nWord of your work in episode {episode_number} \
                   has traveled. I should like to see the manor myself.\n\n- The Curator",
            mood: LetterMood::Mystery,
        },
        LetterDef {
            id: "kitchen_modern_letter",
            title: "Clean Lines",
            body: "A modern kitchen, then. {decor_choice} suits the morning light. \
                   Grandmother would have argued, and lost.\n\n- E.",
            mood: LetterMood::Warm,
        },
        LetterDef {
            id: "kitchen_vintage_letter",
            title: "The Old Stove",
            body: "You kept the old stove. I can almost smell the bread again, \
                   {player_name}.\n\n- E.",
            mood: LetterMood::Reflective,
        },
        LetterDef {
            id: "sunroom_botanical_letter",
            title: "Green Things",
            body: "The ferns approve of you. So do I.\n\n- E.",
            mood: LetterMood::Warm,
        },
        LetterDef {
            id: "sunroom_minimal_letter",
            title: "Room to Breathe",
            body: "Empty space is not emptiness, {player_name}. The sunroom \
                   finally breathes.\n\n- E.",
            mood: LetterMood::Reflective,
        },
        LetterDef {
            id: "library_oak_letter",
            title: "Oak and Ink",
            body: "Oak shelves, as it always was. Some echoes are best kept.\n\n- E.",
            mood: LetterMood::Hopeful,
        },
        LetterDef {
            id: "library_velvet_letter",
            title: "A Softer Study",
            body: "Velvet in the study. Bold. The {room_name} has never looked \
                   less like a museum.\n\n- E.",
            mood: LetterMood::Warm,
        },
        LetterDef {
            id: "echo_overflow_notice",
            title: "Too Many Echoes",
            body: "The house is crowded with memories, {player_name}. One slipped \
                   away before you could hold it.",
            mood: LetterMood::Urgent,
        },
    ]
}

pub fn episodes() -> Vec<EpisodeDef> {
    vec![
        EpisodeDef {
            id: 1,
            name: "Arrival",
            unlock_room_id: None,
            steps: vec![
                EpisodeStepDef {
                    id: "ep1_spawn",
                    description: "Spawn an item from a generator",
                    required_action: "spawn_from_generator",
                },
                EpisodeStepDef {
                    id: "ep1_merge",
                    description: "Merge two items",
                    required_action: "first_merge",
                },
                EpisodeStepDef {
                    id: "ep1_order",
                    description: "Complete an order",
                    required_action: "complete_first_order",
                },
                EpisodeStepDef {
                    id: "ep1_letter",
                    description: "Read a letter",
                    required_action: "read_letter",
                },
            ],
        },
        EpisodeDef {
            id: 2,
            name: "Voices in the Walls",
            unlock_room_id: Some("sunroom_garden"),
            steps: vec![
                EpisodeStepDef {
                    id: "ep2_echo",
                    description: "Witness a Time Echo",
                    required_action: "trigger_first_echo",
                },
                EpisodeStepDef {
                    id: "ep2_choice",
                    description: "Resolve an echo choice",
                    required_action: "resolve_echo_choice",
                },
                EpisodeStepDef {
                    id: "ep2_reroll",
                    description: "Reroll an order",
                    required_action: "use_reroll",
                },
            ],
        },
        EpisodeDef {
            id: 3,
            name: "The Caretaker's Duty",
            unlock_room_id: Some("library_study"),
            steps: vec![EpisodeStepDef {
                id: "ep3_chest",
                description: "Claim the daily bonus chest",
                required_action: "collect_daily_task_bonus",
            }],
        },
    ]
}

pub fn branch_moments() -> Vec<BranchMomentDef> {
    vec![
        BranchMomentDef {
            id: "kitchen_modern_vintage",
            room_id: "kitchen",
            option_a: BranchOptionDef {
                id: "kitchen_modern",
                title: "Clean Lines",
                description: "Strip the kitchen back to steel and light.",
                decor_flag: "kitchen_modern_chosen",
                letter_id: "kitchen_modern_letter",
            },
            option_b: BranchOptionDef {
                id: "kitchen_vintage",
                title: "The Old Stove",
                description: "Restore the kitchen the way it was kept.",
                decor_flag: "kitchen_vintage_chosen",
                letter_id: "kitchen_vintage_letter",
            },
        },
        BranchMomentDef {
            id: "sunroom_path",
            room_id: "sunroom_garden",
            option_a: BranchOptionDef {
                id: "sunroom_botanical",
                title: "Green Things",
                description: "Fill the sunroom with ferns and climbing vines.",
                decor_flag: "sunroom_botanical_chosen",
                letter_id: "sunroom_botanical_letter",
            },
            option_b: BranchOptionDef {
                id: "sunroom_minimal",
                title: "Room to Breathe",
                description: "Keep the sunroom open, bright and bare.",
                decor_flag: "sunroom_minimal_chosen",
                letter_id: "sunroom_minimal_letter",
            },
        },
        BranchMomentDef {
            id: "library_mood",
            room_id: "library_study",
            option_a: BranchOptionDef {
                id: "library_oak",
                title: "Oak and Ink",
                description: "Rebuild the shelves in heavy oak.",
                decor_flag: "library_oak_chosen",
                letter_id: "library_oak_letter",
            },
            option_b: BranchOptionDef {
                id: "library_velvet",
                title: "A Softer Study",
                description: "Drape the study in velvet and lamplight.",
                decor_flag: "library_velvet_chosen",
                letter_id: "library_velvet_letter",
            },
        },
    ]
}

pub fn iap_catalog() -> Vec<IapSkuDef> {
    vec![
        IapSkuDef {
            id: "starter_pack",
            display_name: "Starter Pack",
            price_text: "$2.99",
            coins: 500,
            stars: 0,
            gems: 50,
            energy: 30,
        },
        IapSkuDef {
            id: "coin_chest",
            display_name: "Coin Chest",
            price_text: "$4.99",
            coins: 1500,
            stars: 0,
            gems: 0,
            energy: 0,
        },
        IapSkuDef {
            id: "gem_pouch",
            display_name: "Gem Pouch",
            price_text: "$9.99",
            coins: 0,
            stars: 0,
            gems: 160,
            energy: 0,
        },
    ]
}

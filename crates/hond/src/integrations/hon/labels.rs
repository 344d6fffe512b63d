//! Integer code to label tables for enumerated appliance values.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

pub type Labels = BTreeMap<i64, &'static str>;

fn labels<const N: usize>(entries: [(i64, &'static str); N]) -> Labels {
    entries.into_iter().collect()
}

pub static MACH_MODE: Lazy<Labels> = Lazy::new(|| {
    labels([
        (0, "ready"),
        (1, "ready"),
        (2, "running"),
        (3, "pause"),
        (4, "scheduled"),
        (5, "scheduled"),
        (6, "error"),
        (7, "ending"),
        (8, "test"),
        (9, "ending"),
        (10, "ending"),
    ])
});

pub static WASHING_PR_PHASE: Lazy<Labels> = Lazy::new(|| {
    labels([
        (0, "ready"),
        (1, "washing"),
        (2, "washing"),
        (3, "spin"),
        (4, "rinse"),
        (5, "rinse"),
        (6, "rinse"),
        (7, "drying"),
        (9, "steam"),
        (10, "ready"),
        (11, "spin"),
        (12, "weighting"),
        (13, "weighting"),
        (14, "washing"),
        (15, "washing"),
        (16, "washing"),
        (17, "rinse"),
        (18, "rinse"),
        (19, "scheduled"),
        (20, "tumbling"),
        (24, "refresh"),
        (25, "washing"),
        (26, "heating"),
        (27, "washing"),
    ])
});

pub static TUMBLE_DRYER_PR_PHASE: Lazy<Labels> = Lazy::new(|| {
    labels([
        (0, "ready"),
        (1, "heat_stroke"),
        (2, "drying"),
        (3, "cooldown"),
        (8, "unknown"),
        (11, "ready"),
        (12, "unknown"),
        (13, "cooldown"),
        (14, "heat_stroke"),
        (15, "heat_stroke"),
        (16, "cooldown"),
        (17, "unknown"),
        (18, "tumbling"),
        (19, "drying"),
        (20, "drying"),
    ])
});

pub static TUMBLE_DRYER_DRY_LEVEL: Lazy<Labels> = Lazy::new(|| {
    labels([
        (0, "no_dry"),
        (1, "iron_dry"),
        (2, "no_dry_iron"),
        (3, "cupboard_dry"),
        (4, "extra_dry"),
        (11, "no_dry"),
        (12, "iron_dry"),
        (13, "cupboard_dry"),
        (14, "ready_to_wear"),
        (15, "extra_dry"),
    ])
});

pub static DISHWASHER_PR_PHASE: Lazy<Labels> = Lazy::new(|| {
    labels([
        (0, "ready"),
        (1, "prewash"),
        (2, "washing"),
        (3, "rinse"),
        (4, "drying"),
        (5, "ready"),
        (6, "hot_rinse"),
    ])
});

pub static DIRTY_LEVEL: Lazy<Labels> =
    Lazy::new(|| labels([(0, "unknown"), (1, "little"), (5, "normal"), (7, "very")]));

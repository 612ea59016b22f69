//! Destination organization allocation and rotation.
//!
//! Repositories are sharded across many synthetic organizations instead of
//! landing in one. [`OrgAllocator`] makes up a name and a capacity for the
//! next organization; [`OrgSlot`] tracks how many repositories a worker has
//! placed in its current one.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest capacity an organization is given.
pub const DEFAULT_MIN_ORG_CAPACITY: usize = 5;

/// Exclusive upper bound of the capacity draw.
pub const DEFAULT_MAX_ORG_CAPACITY: usize = 500;

/// Attempts at drawing an unused name before disambiguating with a suffix.
const NAME_ATTEMPTS: usize = 16;

const ADJECTIVES: &[&str] = &[
    "admiring", "agitated", "amazing", "angry", "awesome", "blissful", "bold", "boring", "brave",
    "busy", "charming", "clever", "cool", "compassionate", "competent", "confident", "crazy",
    "dazzling", "determined", "distracted", "dreamy", "eager", "ecstatic", "elastic", "elated",
    "elegant", "eloquent", "epic", "fervent", "festive", "flamboyant", "focused", "friendly",
    "frosty", "gallant", "gifted", "goofy", "gracious", "happy", "hardcore", "heuristic",
    "hopeful", "hungry", "infallible", "inspiring", "jolly", "jovial", "keen", "kind", "laughing",
    "loving", "lucid", "magical", "modest", "musing", "mystifying", "naughty", "nervous", "nice",
    "nifty", "nostalgic", "objective", "optimistic", "peaceful", "pedantic", "pensive",
    "practical", "priceless", "quirky", "quizzical", "relaxed", "reverent", "romantic", "sad",
    "serene", "sharp", "silly", "sleepy", "stoic", "stupefied", "suspicious", "sweet", "tender",
    "thirsty", "trusting", "unruffled", "upbeat", "vibrant", "vigilant", "vigorous", "wizardly",
    "wonderful", "xenodochial", "youthful", "zealous", "zen",
];

const SURNAMES: &[&str] = &[
    "albattani", "allen", "almeida", "archimedes", "ardinghelli", "babbage", "banach", "bardeen",
    "bartik", "bassi", "bell", "benz", "bhabha", "bohr", "booth", "borg", "bose", "boyd",
    "brahmagupta", "brattain", "brown", "carson", "chandrasekhar", "clarke", "colden", "cori",
    "cray", "curie", "darwin", "davinci", "dijkstra", "dubinsky", "easley", "einstein", "elion",
    "engelbart", "euclid", "euler", "fermat", "fermi", "feynman", "franklin", "galileo", "gates",
    "goldberg", "goldstine", "golick", "goodall", "hamilton", "hawking", "heisenberg", "hermann",
    "hodgkin", "hoover", "hopper", "hugle", "hypatia", "jang", "jennings", "jepsen", "joliot",
    "jones", "kalam", "kare", "keller", "khorana", "kilby", "kirch", "knuth", "kowalevski",
    "lalande", "lamarr", "leakey", "leavitt", "lewin", "lichterman", "liskov", "lovelace",
    "lumiere", "mahavira", "mayer", "mccarthy", "mcclintock", "mclean", "meitner", "mendel",
    "mirzakhani", "morse", "murdock", "newton", "nightingale", "nobel", "noether", "northcutt",
    "noyce", "panini", "pare", "pasteur", "payne", "perlman", "pike", "poincare", "poitras",
    "ptolemy", "raman", "ramanujan", "ride", "ritchie", "roentgen", "rosalind", "saha",
    "sammet", "shaw", "shirley", "shockley", "sinoussi", "snyder", "spence", "stallman",
    "stonebraker", "swanson", "swartz", "swirles", "tesla", "thompson", "torvalds", "turing",
    "varahamihira", "visvesvaraya", "volhard", "wescoff", "williams", "wilson", "wing", "wozniak",
    "wright", "yalow", "yonath",
];

/// Generates names and capacities for destination organizations.
///
/// Each worker owns its own allocator, so organizations are never shared
/// between workers. An allocator never hands out the same name twice.
#[derive(Debug)]
pub struct OrgAllocator {
    rng: StdRng,
    min_capacity: usize,
    max_capacity: usize,
    issued: HashSet<String>,
}

impl OrgAllocator {
    /// Create an allocator seeded from the OS.
    pub fn new(min_capacity: usize, max_capacity: usize) -> Self {
        Self::with_rng(StdRng::from_os_rng(), min_capacity, max_capacity)
    }

    /// Create a deterministic allocator.
    pub fn seeded(min_capacity: usize, max_capacity: usize, seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), min_capacity, max_capacity)
    }

    fn with_rng(rng: StdRng, min_capacity: usize, max_capacity: usize) -> Self {
        Self {
            rng,
            min_capacity: min_capacity.max(1),
            max_capacity,
            issued: HashSet::new(),
        }
    }

    /// Draw the next organization: a fresh name and its capacity.
    ///
    /// The capacity is uniform in `[0, max)` and floored at the minimum; when
    /// `max <= min` every organization gets exactly the minimum.
    pub fn allocate(&mut self) -> (String, usize) {
        let capacity = self.draw_capacity();

        let mut name = String::new();
        for _ in 0..NAME_ATTEMPTS {
            name = format!("{}-{}", self.random_token(), capacity);
            if !self.issued.contains(&name) {
                break;
            }
        }
        if self.issued.contains(&name) {
            name = format!("{name}-{}", self.issued.len());
        }

        self.issued.insert(name.clone());
        (name, capacity)
    }

    fn draw_capacity(&mut self) -> usize {
        if self.max_capacity <= self.min_capacity {
            return self.min_capacity;
        }
        self.rng
            .random_range(0..self.max_capacity)
            .max(self.min_capacity)
    }

    fn random_token(&mut self) -> String {
        let adjective = ADJECTIVES[self.rng.random_range(0..ADJECTIVES.len())];
        let surname = SURNAMES[self.rng.random_range(0..SURNAMES.len())];
        format!("{adjective}-{surname}")
    }
}

/// A worker's current placement target.
///
/// Transitions return a new value rather than mutating in place, so the
/// rotation logic can be checked on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgSlot {
    name: Option<String>,
    capacity: usize,
    placed: usize,
}

impl OrgSlot {
    /// A freshly created organization.
    pub fn named(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: Some(name.into()),
            capacity,
            placed: 0,
        }
    }

    /// The destination's default namespace, used when organization creation fails.
    pub fn unnamed(capacity: usize) -> Self {
        Self {
            name: None,
            capacity,
            placed: 0,
        }
    }

    /// Organization name, or `None` for the default namespace.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Repositories this slot may hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Repositories placed so far.
    pub fn placed(&self) -> usize {
        self.placed
    }

    /// The slot after one more repository was placed.
    #[must_use]
    pub fn after_placement(&self) -> Self {
        Self {
            name: self.name.clone(),
            capacity: self.capacity,
            placed: self.placed + 1,
        }
    }

    /// Whether the next placement needs a new organization.
    pub fn is_full(&self) -> bool {
        self.placed >= self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_stays_within_bounds() {
        let mut allocator = OrgAllocator::seeded(5, 500, 7);
        for _ in 0..1_000 {
            let (_, capacity) = allocator.allocate();
            assert!((5..500).contains(&capacity), "capacity {capacity}");
        }
    }

    #[test]
    fn fixed_range_yields_minimum() {
        let mut allocator = OrgAllocator::seeded(1, 1, 7);
        for _ in 0..10 {
            assert_eq!(allocator.allocate().1, 1);
        }
    }

    #[test]
    fn zero_minimum_is_raised_to_one() {
        let mut allocator = OrgAllocator::seeded(0, 0, 7);
        assert_eq!(allocator.allocate().1, 1);
    }

    #[test]
    fn name_carries_token_and_capacity() {
        let mut allocator = OrgAllocator::seeded(5, 500, 11);
        let (name, capacity) = allocator.allocate();

        let suffix = format!("-{capacity}");
        assert!(name.ends_with(&suffix), "{name}");

        let token = name.trim_end_matches(&suffix);
        let (adjective, surname) = token.split_once('-').expect("adjective-surname");
        assert!(ADJECTIVES.contains(&adjective));
        assert!(SURNAMES.contains(&surname));
    }

    #[test]
    fn names_are_unique_per_allocator() {
        let mut allocator = OrgAllocator::seeded(1, 1, 3);
        let mut seen = HashSet::new();
        for _ in 0..5_000 {
            let (name, _) = allocator.allocate();
            assert!(seen.insert(name.clone()), "duplicate {name}");
        }
    }

    #[test]
    fn seeded_allocators_are_deterministic() {
        let mut a = OrgAllocator::seeded(5, 500, 99);
        let mut b = OrgAllocator::seeded(5, 500, 99);
        assert_eq!(a.allocate(), b.allocate());
    }

    #[test]
    fn slot_fills_at_capacity() {
        let slot = OrgSlot::named("brave-turing-2", 2);
        assert!(!slot.is_full());

        let slot = slot.after_placement();
        assert_eq!(slot.placed(), 1);
        assert!(!slot.is_full());

        let slot = slot.after_placement();
        assert!(slot.is_full());
        assert_eq!(slot.name(), Some("brave-turing-2"));
    }

    #[test]
    fn unnamed_slot_keeps_capacity() {
        let slot = OrgSlot::unnamed(3);
        assert_eq!(slot.name(), None);
        assert_eq!(slot.capacity(), 3);
        assert_eq!(slot.placed(), 0);
    }
}

//! Person model and the factory that fills it with sample data.

use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A member of a generated hierarchy.
///
/// People are created once by a [`PersonFactory`] and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    first_name: String,
    last_name: String,
    address: String,
}

impl Person {
    /// Creates a person from already generated data.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            address: address.into(),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// Source of fake people.
///
/// The hierarchy generator only needs "give me a new person"; where names and
/// addresses come from is up to the implementation.
pub trait PersonFactory {
    /// Creates a new person, drawing any randomness from `rng`.
    fn create<R: Rng + ?Sized>(&self, rng: &mut R) -> Person;
}

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alma", "Arthur", "Bea", "Bruno", "Carla", "Cyril", "Dora", "Edgar", "Elena", "Felix",
    "Greta", "Hugo", "Ida", "Ivan", "Jonas", "Klara", "Leon", "Lotte", "Malte", "Mira", "Nils",
    "Olga", "Otto", "Paula", "Quentin", "Rosa", "Sven", "Tilda", "Ugo", "Vera", "Walter", "Yara",
];

const LAST_NAMES: &[&str] = &[
    "Albers", "Becker", "Brandt", "Claes", "Dietrich", "Engel", "Fischer", "Graf", "Hartmann",
    "Jansen", "Keller", "Lang", "Meyer", "Neumann", "Otten", "Peters", "Richter", "Schulz",
    "Sommer", "Thiel", "Vogel", "Weber", "Winter", "Zimmer",
];

const STREET_NAMES: &[&str] = &[
    "Ash Lane", "Birch Road", "Canal Street", "Elm Avenue", "Harbor Way", "Hill Street",
    "Linden Walk", "Market Square", "Mill Road", "Oak Drive", "Park Row", "River Lane",
    "Station Road", "Willow Court",
];

const CITIES: &[&str] = &[
    "Aldgate", "Bramford", "Carrow", "Dunmere", "Eastwick", "Fairholm", "Greystone", "Hollins",
    "Kingsbury", "Lowmoor", "Marlow", "Northfield", "Redbank", "Westbrook",
];

/// Built-in factory picking names and addresses from fixed word lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleFactory;

impl PersonFactory for SampleFactory {
    fn create<R: Rng + ?Sized>(&self, rng: &mut R) -> Person {
        let first = pick(FIRST_NAMES, rng);
        let last = pick(LAST_NAMES, rng);
        let street = pick(STREET_NAMES, rng);
        let zip: u32 = rng.random_range(10000..100000);
        let city = pick(CITIES, rng);

        Person::new(first, last, format!("{}, {} {}", street, zip, city))
    }
}

fn pick<R: Rng + ?Sized>(words: &[&'static str], rng: &mut R) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_display_is_full_name() {
        let person = Person::new("Ada", "Albers", "Mill Road, 12345 Marlow");
        assert_eq!(person.to_string(), "Ada Albers");
    }

    #[test]
    fn test_sample_factory_fills_every_field() {
        let mut rng = StdRng::seed_from_u64(7);
        let person = SampleFactory.create(&mut rng);

        assert!(FIRST_NAMES.contains(&person.first_name()));
        assert!(LAST_NAMES.contains(&person.last_name()));
        assert!(!person.address().is_empty());
    }

    #[test]
    fn test_sample_address_format() {
        let mut rng = StdRng::seed_from_u64(42);
        let person = SampleFactory.create(&mut rng);

        // "<street>, <zip> <city>"
        let (street, rest) = person.address().split_once(", ").unwrap();
        let (zip, city) = rest.split_once(' ').unwrap();
        assert!(STREET_NAMES.contains(&street));
        assert_eq!(zip.len(), 5);
        assert!(zip.chars().all(|c| c.is_ascii_digit()));
        assert!(CITIES.contains(&city));
    }

    #[test]
    fn test_same_seed_same_person() {
        let a = SampleFactory.create(&mut StdRng::seed_from_u64(3));
        let b = SampleFactory.create(&mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}

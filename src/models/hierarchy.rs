//! Hierarchy model and the degree-bounded random tree generator.

use rand::Rng;
use serde::Serialize;

use super::person::{Person, PersonFactory, SampleFactory};

/// Smallest accepted maximum degree.
pub const MIN_DEGREE: usize = 1;
/// Largest accepted maximum degree.
pub const MAX_DEGREE: usize = 7;
/// Number of people generated when nothing else is configured.
pub const DEFAULT_COUNT: usize = 20;
/// Maximum degree used when nothing else is configured.
pub const DEFAULT_DEGREE: usize = 4;

/// A parent/child link between two people, as indices into [`Hierarchy::people`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub parent: usize,
    pub child: usize,
}

/// A rooted tree of people.
///
/// `people[0]` is the root; people appear in creation order, and every person
/// except the root has exactly one link naming it as the child.
#[derive(Debug, Clone, Serialize)]
pub struct Hierarchy {
    people: Vec<Person>,
    links: Vec<Link>,
}

impl Hierarchy {
    /// Generates a random hierarchy of `count` people.
    ///
    /// `degree` is the maximum number of links any person may take part in and
    /// is clamped to `[MIN_DEGREE, MAX_DEGREE]`. Each new person is linked to a
    /// uniformly sampled existing person that still has capacity.
    ///
    /// With a degree of 1 only the root can ever take a child, so once it has
    /// one the generator extends a chain from the newest person instead.
    pub fn random<R, F>(count: usize, degree: usize, rng: &mut R, factory: &F) -> Self
    where
        R: Rng + ?Sized,
        F: PersonFactory,
    {
        let degree = degree.clamp(MIN_DEGREE, MAX_DEGREE);

        let mut people = Vec::with_capacity(count.max(1));
        let mut links = Vec::with_capacity(count.saturating_sub(1));

        people.push(factory.create(rng));
        let mut degrees = vec![0usize];
        // People whose degree is still below the bound.
        let mut open = 1usize;

        for _ in 1..count {
            let person = factory.create(rng);

            let parent = if open == 0 {
                people.len() - 1
            } else {
                loop {
                    let candidate = rng.random_range(0..people.len());
                    if degrees[candidate] < degree {
                        break candidate;
                    }
                }
            };

            let child = people.len();
            links.push(Link { parent, child });
            people.push(person);
            degrees.push(1);
            if degree > 1 {
                open += 1;
            }

            let was_open = degrees[parent] < degree;
            degrees[parent] += 1;
            if was_open && degrees[parent] >= degree {
                open -= 1;
            }
        }

        tracing::debug!(
            people = people.len(),
            links = links.len(),
            degree,
            "Generated random hierarchy"
        );

        Self { people, links }
    }

    /// Generates a hierarchy with the default size and degree, using the
    /// thread-local RNG and the built-in sample data.
    pub fn random_default() -> Self {
        Self::random(
            DEFAULT_COUNT,
            DEFAULT_DEGREE,
            &mut rand::rng(),
            &SampleFactory,
        )
    }

    /// All people in creation order.
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// All links in creation order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The root person.
    pub fn root(&self) -> &Person {
        &self.people[0]
    }

    pub fn person(&self, index: usize) -> Option<&Person> {
        self.people.get(index)
    }

    /// Number of links each person takes part in, indexed like `people`.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0; self.people.len()];
        for link in &self.links {
            degrees[link.parent] += 1;
            degrees[link.child] += 1;
        }
        degrees
    }

    /// Indices of the direct children of `index`.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.links
            .iter()
            .filter(move |l| l.parent == index)
            .map(|l| l.child)
    }

    /// Index of the parent of `index`, `None` for the root.
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.links
            .iter()
            .find(|l| l.child == index)
            .map(|l| l.parent)
    }
}

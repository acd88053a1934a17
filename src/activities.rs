use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MergingtonError;

const SCHOOL_DOMAIN: &str = "mergington.edu";

/// Failures of a registry operation. Every variant except `InvalidSeed`
/// is a deterministic consequence of the request relative to current state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Activity not found")]
    NotFound { activity: String },

    #[error("Student is already signed up")]
    AlreadyRegistered { activity: String, email: String },

    #[error("Student is not registered for this activity")]
    NotRegistered { activity: String, email: String },

    #[error("Invalid activity seed: {0}")]
    InvalidSeed(String),
}

/// A single extracurricular activity and its current roster.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub description: String,
    pub schedule: String,
    pub max_participants: u32,
    /// Participant emails in signup order
    pub participants: Vec<String>,
}

impl Activity {
    pub fn new(description: &str, schedule: &str, max_participants: u32, participants: &[&str]) -> Self {
        Activity {
            description: description.to_owned(),
            schedule: schedule.to_owned(),
            max_participants,
            participants: participants.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn is_registered(&self, email: &str) -> bool {
        self.participants.iter().any(|p| p == email)
    }

    /// Open spots left. Capacity is informational and never enforced, so an
    /// oversubscribed activity reports zero rather than a negative count.
    pub fn spots_left(&self) -> u32 {
        let taken = u32::try_from(self.participants.len()).unwrap_or(u32::MAX);
        self.max_participants.saturating_sub(taken)
    }

    fn validate(&self, name: &str) -> Result<(), RegistryError> {
        if self.max_participants == 0 {
            return Err(RegistryError::InvalidSeed(format!(
                "'{}' has a max_participants of 0",
                name
            )));
        }

        for (i, email) in self.participants.iter().enumerate() {
            if self.participants[..i].contains(email) {
                return Err(RegistryError::InvalidSeed(format!(
                    "'{}' lists participant '{}' more than once",
                    name, email
                )));
            }
        }

        Ok(())
    }
}

pub type ActivityMap = BTreeMap<String, Activity>;

/// In-memory store of every activity. Constructed once at startup and shared
/// with the request layer through an `Arc`.
///
/// A single registry-wide lock guards all rosters. Mutations hold the write
/// lock across the membership check and the change, so a participant can
/// never appear twice in one activity even under concurrent requests.
#[derive(Debug)]
pub struct ActivityRegistry {
    activities: RwLock<ActivityMap>,
}

impl ActivityRegistry {
    /// Builds a registry from an arbitrary seed, rejecting seeds that already
    /// violate the roster invariants.
    pub fn from_seed(seed: ActivityMap) -> Result<Self, RegistryError> {
        for (name, activity) in &seed {
            activity.validate(name)?;
        }

        debug!("Activity registry created with {} activities", seed.len());

        Ok(ActivityRegistry {
            activities: RwLock::new(seed),
        })
    }

    /// Registry populated with the school's standard activity list
    pub fn seeded() -> Self {
        ActivityRegistry {
            activities: RwLock::new(default_activities()),
        }
    }

    /// Reads a JSON seed file shaped like the `GET /activities` response
    pub fn load_seed_file(path: &Path) -> Result<Self, MergingtonError> {
        let contents = fs::read_to_string(path)?;
        let seed: ActivityMap = serde_json::from_str(&contents)?;
        let registry = Self::from_seed(seed)?;

        info!(
            "Loaded {} activities from seed file {}",
            registry.len(),
            path.display()
        );

        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Snapshot of every activity, including current participants
    pub fn list_all(&self) -> ActivityMap {
        self.read().clone()
    }

    pub fn get(&self, activity_name: &str) -> Result<Activity, RegistryError> {
        self.read()
            .get(activity_name)
            .cloned()
            .ok_or_else(|| not_found(activity_name))
    }

    /// Appends `email` to the end of the activity's roster
    pub fn signup(&self, activity_name: &str, email: &str) -> Result<String, RegistryError> {
        let mut activities = self.write();
        let activity = activities
            .get_mut(activity_name)
            .ok_or_else(|| not_found(activity_name))?;

        if activity.is_registered(email) {
            return Err(RegistryError::AlreadyRegistered {
                activity: activity_name.to_owned(),
                email: email.to_owned(),
            });
        }

        activity.participants.push(email.to_owned());

        Ok(format!("Signed up {} for {}", email, activity_name))
    }

    /// Removes `email` from the activity's roster, keeping the order of the rest
    pub fn unregister(&self, activity_name: &str, email: &str) -> Result<String, RegistryError> {
        let mut activities = self.write();
        let activity = activities
            .get_mut(activity_name)
            .ok_or_else(|| not_found(activity_name))?;

        let pos = activity
            .participants
            .iter()
            .position(|p| p == email)
            .ok_or_else(|| RegistryError::NotRegistered {
                activity: activity_name.to_owned(),
                email: email.to_owned(),
            })?;

        activity.participants.remove(pos);

        Ok(format!("Unregistered {} from {}", email, activity_name))
    }

    // Roster updates are single push/remove calls, so a panic elsewhere while
    // the lock was held cannot leave the map half-written. Recover the guard.
    fn read(&self) -> RwLockReadGuard<'_, ActivityMap> {
        self.activities.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ActivityMap> {
        self.activities.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}

fn not_found(activity_name: &str) -> RegistryError {
    RegistryError::NotFound {
        activity: activity_name.to_owned(),
    }
}

fn student(name: &str) -> String {
    format!("{}@{}", name, SCHOOL_DOMAIN)
}

fn seed_entry(
    name: &str,
    description: &str,
    schedule: &str,
    max_participants: u32,
    students: &[&str],
) -> (String, Activity) {
    let emails: Vec<String> = students.iter().map(|s| student(s)).collect();
    let emails: Vec<&str> = emails.iter().map(String::as_str).collect();

    (
        name.to_owned(),
        Activity::new(description, schedule, max_participants, &emails),
    )
}

/// The standard activity list offered at the start of each term
pub fn default_activities() -> ActivityMap {
    [
        seed_entry(
            "Chess Club",
            "Learn strategies and compete in chess tournaments",
            "Fridays, 3:30 PM - 5:00 PM",
            12,
            &["michael", "daniel"],
        ),
        seed_entry(
            "Programming Class",
            "Learn programming fundamentals and build software projects",
            "Tuesdays and Thursdays, 3:30 PM - 4:30 PM",
            20,
            &["emma", "sophia"],
        ),
        seed_entry(
            "Gym Class",
            "Physical education and sports activities",
            "Mondays, Wednesdays, Fridays, 2:00 PM - 3:00 PM",
            30,
            &["john", "olivia"],
        ),
        seed_entry(
            "Soccer Team",
            "Join the school soccer team and compete in matches",
            "Tuesdays and Thursdays, 4:00 PM - 5:30 PM",
            22,
            &["liam", "noah"],
        ),
        seed_entry(
            "Basketball Team",
            "Practice and play basketball with the school team",
            "Wednesdays and Fridays, 3:30 PM - 5:00 PM",
            15,
            &["ava", "mia"],
        ),
        seed_entry(
            "Art Club",
            "Explore your creativity through painting and drawing",
            "Thursdays, 3:30 PM - 5:00 PM",
            15,
            &["amelia", "harper"],
        ),
        seed_entry(
            "Drama Club",
            "Act, direct, and produce plays and performances",
            "Mondays and Wednesdays, 4:00 PM - 5:30 PM",
            20,
            &["ella", "scarlett"],
        ),
        seed_entry(
            "Math Club",
            "Solve challenging problems and participate in math competitions",
            "Tuesdays, 3:30 PM - 4:30 PM",
            10,
            &["james", "benjamin"],
        ),
        seed_entry(
            "Debate Team",
            "Develop public speaking and argumentation skills",
            "Fridays, 4:00 PM - 5:30 PM",
            12,
            &["charlotte", "henry"],
        ),
    ]
    .into_iter()
    .collect()
}

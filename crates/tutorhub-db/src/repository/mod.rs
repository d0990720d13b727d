//! SurrealDB repository implementations.

mod availability;
mod booking;
mod draft;
mod history;
mod modification;
mod session;
mod subject;
mod teacher;

use surrealdb::{Connection, Surreal};
use tutorhub_core::repository::Repositories;

pub use availability::SurrealAvailabilityRepository;
pub use booking::SurrealBookingRepository;
pub use draft::SurrealBookingDraftRepository;
pub use history::SurrealBookingHistoryRepository;
pub use modification::SurrealBookingModificationRepository;
pub use session::SurrealTeachingSessionRepository;
pub use subject::SurrealSubjectRepository;
pub use teacher::SurrealTeacherProfileRepository;

/// Every SurrealDB repository over one shared connection.
#[derive(Clone)]
pub struct SurrealRepositories<C: Connection> {
    profiles: SurrealTeacherProfileRepository<C>,
    subjects: SurrealSubjectRepository<C>,
    availability: SurrealAvailabilityRepository<C>,
    bookings: SurrealBookingRepository<C>,
    history: SurrealBookingHistoryRepository<C>,
    sessions: SurrealTeachingSessionRepository<C>,
    modifications: SurrealBookingModificationRepository<C>,
    drafts: SurrealBookingDraftRepository<C>,
}

impl<C: Connection> SurrealRepositories<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            profiles: SurrealTeacherProfileRepository::new(db.clone()),
            subjects: SurrealSubjectRepository::new(db.clone()),
            availability: SurrealAvailabilityRepository::new(db.clone()),
            bookings: SurrealBookingRepository::new(db.clone()),
            history: SurrealBookingHistoryRepository::new(db.clone()),
            sessions: SurrealTeachingSessionRepository::new(db.clone()),
            modifications: SurrealBookingModificationRepository::new(db.clone()),
            drafts: SurrealBookingDraftRepository::new(db),
        }
    }
}

impl<C: Connection> Repositories for SurrealRepositories<C> {
    type Profiles = SurrealTeacherProfileRepository<C>;
    type Subjects = SurrealSubjectRepository<C>;
    type Availability = SurrealAvailabilityRepository<C>;
    type Bookings = SurrealBookingRepository<C>;
    type History = SurrealBookingHistoryRepository<C>;
    type Sessions = SurrealTeachingSessionRepository<C>;
    type Modifications = SurrealBookingModificationRepository<C>;
    type Drafts = SurrealBookingDraftRepository<C>;

    fn profiles(&self) -> &Self::Profiles {
        &self.profiles
    }

    fn subjects(&self) -> &Self::Subjects {
        &self.subjects
    }

    fn availability(&self) -> &Self::Availability {
        &self.availability
    }

    fn bookings(&self) -> &Self::Bookings {
        &self.bookings
    }

    fn history(&self) -> &Self::History {
        &self.history
    }

    fn sessions(&self) -> &Self::Sessions {
        &self.sessions
    }

    fn modifications(&self) -> &Self::Modifications {
        &self.modifications
    }

    fn drafts(&self) -> &Self::Drafts {
        &self.drafts
    }
}

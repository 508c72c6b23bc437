pub mod domain;
pub mod generation;
pub mod locks;
pub mod memory;
pub mod orchestrator;
pub mod ports;
pub mod prompts;
pub mod videos;

pub use domain::{
    AuthSession, Course, CourseSummary, Flashcard, ModuleSlot, OwnerId, RoadmapEntry, User,
    UserCredentials, VideoRef,
};
pub use generation::{ContentGenerator, GenerationError, GenerationKind};
pub use memory::InMemoryStore;
pub use orchestrator::{CourseError, CourseResult, GenerationOrchestrator, GenerationPolicy};
pub use ports::{
    DatabaseService, IdentityProvider, PortError, PortResult, TextGenerationService,
    VideoSearchService,
};
pub use videos::VideoFinder;

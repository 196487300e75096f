pub mod domain;
pub mod ports;
pub mod scope;
pub mod store;
pub mod validation;
pub mod view;

pub use domain::{
    EligibilityAnalysis, EligibilityStatus, GamificationState, Opportunity, OpportunityType,
    Profile, ProfileData, ProfileOrigin, Session, TrackedAction,
};
pub use ports::{
    AuthService, Backend, GamificationService, InsightsService, OpportunityService, PortError,
    PortResult, ProfileService, ReasoningService, StorageService, TrackerService,
};
pub use scope::ViewScope;
pub use store::{AppStore, ClientState};
pub use view::{Modal, Tab, ViewState};

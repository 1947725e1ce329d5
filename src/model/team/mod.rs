pub use composition::{
    is_registrable, is_role_exceeded, is_role_full, missing_required_roles, occupancy_by_role,
    validation_errors, CompositionReport, Finding, Occupancy, RoleExcess, RoleStatus,
};
pub use join_request::{JoinRequest, JoinRequestCore, JoinRequestState, NewJoinRequest};
pub use membership::{MemberId, Membership, TeamMembership};
pub use role::{
    team_size_bounds, Role, RoleSpec, RoleTag, UnknownRole, MAX_TEAM_SIZE, MIN_TEAM_SIZE,
    ROLE_TABLE,
};
pub use team_core::{
    name_key, validate_team_name, AcceptanceStatus, NewTeam, RegistrationStatus, Team, TeamCore,
    MAX_TEAM_NAME_LENGTH,
};

pub mod composition;
mod join_request;
mod membership;
pub mod role;
mod team_core;

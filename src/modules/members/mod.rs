pub mod controller;
pub mod router;
pub mod service;

pub use router::init_members_router;
pub use service::MemberService;

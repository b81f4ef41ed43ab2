pub mod dto;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::UserRepository;
pub use repo_types::User;
pub use services::UserService;

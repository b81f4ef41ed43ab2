pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use handlers::router;
pub use repo::AccountRepository;
pub use repo_types::Account;
pub use services::AccountService;

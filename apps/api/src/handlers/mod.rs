pub mod admin;
pub mod assignments;
pub mod health;
pub mod organizations;
pub mod permissions;
pub mod roles;
pub mod turfs;

//! Password hashing and JWT issuance/verification for the fixed
//! admin/manager/analyst role model used across the fabric.

pub mod jwt;
pub mod password;

pub use jwt::{extract_bearer_token, issue_token, verify_token, JwtConfig};
pub use password::{hash_password, hash_password_with_cost, verify_password};

mod customer_auth;

pub use customer_auth::customer_auth_middleware;

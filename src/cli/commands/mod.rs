pub mod check_env;
pub mod serve;
pub mod sign;

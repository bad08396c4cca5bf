pub mod audit;
pub mod balance;
pub mod category;
pub mod dong;
pub mod joint_account;
pub mod user;
pub mod users_rel;

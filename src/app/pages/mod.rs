pub mod approve_erc20;
pub mod home;

// Audit log action names
pub const USER_REGISTERED: &str = "USER_REGISTERED";
pub const USER_LOGGED_IN: &str = "USER_LOGGED_IN";
pub const CONTACT_ADDED: &str = "CONTACT_ADDED";
pub const CATEGORY_CREATED: &str = "CATEGORY_CREATED";
pub const JOINT_ACCOUNT_CREATED: &str = "JOINT_ACCOUNT_CREATED";
pub const DONG_CREATED: &str = "DONG_CREATED";
pub const DONG_DELETED: &str = "DONG_DELETED";
pub const BALANCE_QUERIED: &str = "BALANCE_QUERIED";

pub const DEFAULT_CURRENCY: &str = "IRR";

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;

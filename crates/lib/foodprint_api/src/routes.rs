//! Route paths.

pub const GET_API_HEALTH: &str = "/api/health";

pub const POST_USERS_REGISTER: &str = "/api/users/register";
pub const POST_USERS_LOGIN: &str = "/api/users/login";
pub const POST_USERS_REFRESH_TOKEN: &str = "/api/users/refresh_token";
pub const POST_USERS_REVOKE_TOKEN: &str = "/api/users/revoke_token";

pub const POST_USERS_CHANGE_USERNAME: &str = "/api/users/change/username";
pub const POST_USERS_AVATAR: &str = "/api/users/avatar";
pub const POST_USERS_CHANGE_PASSWORD: &str = "/api/users/change/password";
pub const DELETE_USERS_DELETE: &str = "/api/users/delete";

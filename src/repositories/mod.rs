pub(crate) mod accounts;
pub(crate) mod admin_profiles;
pub(crate) mod health;
pub(crate) mod messages;
pub(crate) mod stations;
pub(crate) mod students;
pub(crate) mod work_sessions;

pub(crate) mod phone;
pub(crate) mod photos;
pub(crate) mod registration;
pub(crate) mod storage;
pub(crate) mod work_sessions;

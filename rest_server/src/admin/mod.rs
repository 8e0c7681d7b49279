pub(crate) mod route;
pub(crate) mod utils;

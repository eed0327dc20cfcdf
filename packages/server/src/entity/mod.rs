pub mod component;
pub mod evidence;
pub mod period;

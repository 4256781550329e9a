pub mod audience;
pub mod dispatch;
pub mod notification;
pub mod preferences;
pub mod stats;
pub mod template;

pub mod form;
pub mod help;
pub mod select;
pub mod widgets;

pub use form::{render_compact_view, render_form_view};
pub use help::render_help;
pub use select::render_select_dialog;

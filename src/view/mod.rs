//! Text views over the call state
//!
//! Everything here is a pure function of a [`CallSnapshot`](crate::session::CallSnapshot);
//! the only user-visible side effects of a call come from the controller.

mod format;
mod render;

pub use format::{display_tool_name, format_date, format_time, is_truthy, tool_icon};
pub use render::{
    render_call, render_status, render_summary, render_tool_calls, render_transcript, ToolCard,
    ToolStatus,
};

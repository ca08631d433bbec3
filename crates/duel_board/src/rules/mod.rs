//! Game rules for the 3x3 board.
//!
//! Pure functions over a [`Board`](crate::Board). They never mutate the
//! board and have no error cases.

mod draw;
mod win;

pub use draw::check_draw;
pub use win::check_win;

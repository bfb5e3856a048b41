//! formtree - reactive form state
//!
//! Models a tree of input controllers that track value, dirtiness,
//! validity and enabled state. A change to any field re-runs the
//! validators of that field and of every ancestor, so reads of
//! `valid`/`dirty`/`value` always reflect the latest mutation.
//!
//! ```
//! use formtree::{required, Controller, Group, Leaf};
//!
//! fn main() -> formtree::FormResult<()> {
//!     let name = Leaf::with_validators(String::new(), vec![required()]);
//!     let form = Group::new([("name", name.to_control())])?;
//!     assert!(!form.valid());
//!     name.update("Tom".to_string());
//!     assert!(form.valid());
//!     Ok(())
//! }
//! ```

mod error;
pub mod forms;

pub use error::{FormError, FormResult};
pub use forms::*;

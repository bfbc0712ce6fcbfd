//! # volume-scroll
//!
//! Scroll through one axis of up to four co-registered 3D volumes at once, or
//! through a single volume with a semi-transparent mask laid over it.
//!
//! Every panel always shows the same slice index. Scrolling the mouse wheel
//! moves all panels one slice forward or backward, wrapping around at both ends,
//! and the caption above the panels shows the current slice counting from 1.
//!
//! Display parameters are validated before any window is created:
//!  - Volumes must be 3D arrays of identical shape, 1 to 4 of them
//!  - Color maps and slice labels are given once for all volumes or once per volume
//!  - Mask opacity is an integer percentage in [0, 100], a fraction in [0, 1] or
//!    an array with the shape of the volume
//!  - The scroll axis is any of the three axes and is moved to the last position
//!
//! Rendering goes through the [`Backend`](surface::Backend) trait. The `viewer`
//! feature provides a native window built on eframe; [`recording::Headless`]
//! replays a fixed list of scroll events without a window.
//!
//! # Examples
//!
//! ## Scrolling through two volumes side by side
//!
//! ```no_run
//! # use volume_scroll::{scroll, ScrollOptions};
//! # use volume_scroll::recording::Headless;
//! # use volume_scroll::surface::ScrollEvent;
//! # use ndarray::Array3;
//! let t1 = Array3::<f32>::zeros((64, 64, 24)).into_dyn();
//! let t2 = Array3::<f32>::zeros((64, 64, 24)).into_dyn();
//! let backend = Headless::new([ScrollEvent::up()]);
//! scroll(backend, vec![t1, t2], ScrollOptions::default().with_cmap(["gray", "hot"]))
//!     .expect("volumes should have matching shapes");
//! ```
//!
//! ## Overlaying a mask at 30% opacity
//!
//! ```no_run
//! # use volume_scroll::{scroll_mask, MaskOptions};
//! # use volume_scroll::normalizer::AlphaInput;
//! # use volume_scroll::recording::Headless;
//! # use ndarray::Array3;
//! let volume = Array3::<u16>::zeros((64, 64, 24)).into_dyn();
//! let mask = Array3::<u16>::zeros((64, 64, 24)).into_dyn();
//! let options = MaskOptions::default().with_alpha(AlphaInput::Int(30));
//! scroll_mask(Headless::default(), volume, mask, options).expect("mask should match the volume");
//! ```

pub mod colormap;
pub mod enums;
pub mod layout;
pub mod normalizer;
pub mod recording;
pub mod session;
pub mod surface;
pub mod tracker;
#[cfg(feature = "viewer")]
pub mod viewer;
pub mod volume;
pub mod volume_loader;

pub use session::{MaskOptions, ScrollOptions, SessionError, scroll, scroll_mask};

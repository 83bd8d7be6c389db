//! # hyperion-fuzzy
//!
//! Conformal-kernel twin-hypersphere fuzzy classifier.
//!
//! ---
//!
//! Each class is covered by a few hyperspheres. A sphere carries a center, a
//! radius and a set of anchoring training points ("elements") that shape a
//! data-dependent **conformal kernel**: a Gaussian RBF scaled on both sides by
//! a factor that is large near the sphere's elements and vanishes far from
//! them.
//!
//! **Classification** reads that kernel against each sphere's center as a
//! boundary-distance surrogate. The class whose nearest boundary is closer
//! claims the point, and the winning sphere logs it with a fuzzy weight.
//!
//! **Refinement** reshapes each sphere from its log: a numerical minimizer
//! tightens the radius and pushes the center away from points claimed by the
//! competing class.
//!
//! **Prediction** reads the same kernel as membership: the class with the
//! best-matching sphere wins, and exact ties stay undecided.
//!
//! ## The pipeline
//!
//! ```text
//! inputs → FeatureMap → classify_and_contribute → refine → … → predict_batch
//!                              ↑                     ↑
//!                     conformal_kernel          Minimizer (Bfgs)
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`hypersphere`] | [`Hypersphere`], [`Assignment`], [`Label`] | Sphere geometry, element mean, assignment log |
//! | [`kernel`] | [`conformal_kernel`] | Squared distance, RBF, conformal factor |
//! | [`classify`] | [`FuzzyParams`], [`FuzzyOutcome`] | Nearest-boundary classification with fuzzy contribution |
//! | [`predict`] | [`predict_batch`] | Max-membership batch prediction |
//! | [`minimize`] | [`Minimizer`], [`Bfgs`], [`GradientDescent`] | `argmin` BFGS and gradient descent over finite-difference gradients |
//! | [`optimize`] | [`RefineParams`], [`RefineObjective`] | Radius and center refinement |
//! | [`config`] | [`HyperionConfig`], [`FeatureMap`] | Training and inference configuration |
//! | [`model`] | [`HyperionFuzzy`], [`TrainReport`] | Seeded initialisation and the training loop |
//! | [`error`] | [`HyperionError`] | Error type shared by every fallible operation |
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` on [`HyperionConfig`], [`Label`] and friends.
//! - `parallel`: score batch predictions on the rayon pool.
//! - `python-ffi`: PyO3 bindings (see `ffi`).
//!
//! ## License
//!
//! Business Source License 1.1.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod classify;
pub mod config;
pub mod error;
pub mod hypersphere;
pub mod kernel;
pub mod minimize;
pub mod model;
pub mod optimize;
pub mod predict;

#[cfg(feature = "python-ffi")]
#[allow(unsafe_code)] // PyO3 macro expansions
pub mod ffi;

pub use classify::{classify_and_contribute, fuzzy_confidence, ContributionForm, FuzzyOutcome, FuzzyParams};
pub use config::{FeatureMap, HyperionConfig};
pub use error::{HyperionError, HyperionResult};
pub use hypersphere::{Assignment, Hypersphere, Label};
pub use kernel::{conformal_factor, conformal_kernel, rbf, squared_distance};
pub use minimize::{Bfgs, GradientDescent, MinimizeOutcome, Minimizer};
pub use model::{HyperionFuzzy, TrainReport};
pub use optimize::{refine, refine_with, RefineObjective, RefineParams};
pub use predict::{predict_batch, predict_flat, predict_point};

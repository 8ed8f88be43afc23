pub mod apply;
pub mod fingerprint;
pub mod headings;
pub mod round;

pub use apply::{apply, ApplyArgs};
pub use fingerprint::{fingerprint, FingerprintArgs};
pub use headings::{headings, HeadingsArgs};
pub use round::{round, RoundArgs};

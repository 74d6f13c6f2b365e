//! FAIR Form 3 Common Library
//!
//! Form 3（特性一覧）の編集状態・下書き・帳票レイアウトを扱う純粋なドメイン層。
//! ネットワークやファイルI/Oはルートクレート側で行う。

pub mod classification;
pub mod crop;
pub mod draft;
pub mod error;
pub mod export;
pub mod field;
pub mod grid;
pub mod layout;
pub mod persistence;
pub mod requirement;
pub mod stream;
pub mod tolerance;
pub mod voice;

pub use classification::{Designator, ResultsClassification};
pub use crop::{CropPlan, CropSession, CropState, Rect, SourceKind};
pub use error::{Error, Result};
pub use field::{CompositeValue, FieldKey, FieldKind, FieldShape, FieldValue, RowIndex, Snapshot};
pub use grid::{FormGrid, HeaderFields, Requirement, Row};
pub use layout::{ExcelLayout, PdfLayout};
pub use persistence::{restore_draft, save_draft, DraftStore, FormSession, MemoryDraftStore};
pub use stream::{ExtractedRow, StreamParser};
pub use tolerance::{ToleranceField, ToleranceType, ToleranceValues};
pub use voice::normalize_spoken_text;

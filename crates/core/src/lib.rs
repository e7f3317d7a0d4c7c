pub mod coords;
pub mod ids;
pub mod model;
pub mod selection;

pub use coords::CoordinateMaps;
pub use ids::{ColumnId, RowId, TableId};
pub use model::{Cell, Column, ColumnType, Row};
pub use selection::{CellRange, FillPreview, GridCell, SelectionRange};

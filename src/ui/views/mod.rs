mod record_detail;
mod record_list;
mod rows;

pub use record_list::RecordListView;
pub use rows::ListRow;

pub mod files;
pub mod store;

pub use files::{
    atomic_write, ensure_data_dir, get_data_dir, init_local_dir, projects_file, read_file,
};
pub use store::{import_projects, load_projects, save_projects};

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{expand_data_dir, load_settings, save_settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(dir) = data_dir {
        settings.data_dir = expand_data_dir(&dir)?.to_string_lossy().to_string();
    }
    save_settings(&settings)?;

    let db = settings.db_path();
    if let Some(dir) = db.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = get_connection(&db)?;
    init_db(&conn)?;

    println!("Initialized budget at {}", settings.data_dir);
    Ok(())
}

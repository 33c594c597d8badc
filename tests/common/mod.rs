//! Shared fixtures for route engine integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use action_router::{MemorySource, Router};

/// A route file exercising constraints, formats, hosts and templated actions.
pub const APP_ROUTES: &str = r#"
# application routes
GET     /                                   Application.index
GET     /users/?                            Users.list
GET     /users/{<[0-9]+>id}                 Users.show
GET     /users/{<[0-9]+>id}.{format}        Users.show
POST    /users                              Users.create
PUT     /users/{<[0-9]+>id}                 Users.update
DELETE  /users/{<[0-9]+>id}                 Users.delete
GET     /feed                               Feed.show          {format:'rss'}
GET     /feed                               Feed.show
GET     {tenant}.example.com/dashboard      Dashboard.index
GET     /admin/{controller}/{page}          admin.{controller}.{page}
*       /api/{<.*>path}                     Api.proxy
"#;

/// Router loaded from an in-memory route file.
pub fn router_from(content: &str) -> Router {
    let router = Router::new();
    router
        .load(&[MemorySource::new("routes", content)])
        .expect("fixture routes load");
    router
}

/// Write `content` to `dir/name` and return the path.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Push a file's modification time `secs` into the future so change
/// detection sees it regardless of filesystem timestamp granularity.
#[allow(dead_code)]
pub fn touch_ahead(path: &Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
}

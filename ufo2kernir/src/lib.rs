//! Reading kerning from [Unified Font Object][UFO] files and designspaces.
//!
//! [UFO]: http://unifiedfontobject.org

mod axes;
pub mod error;
pub mod source;
mod toir;

#[cfg(test)]
pub(crate) fn testdata_dir() -> std::path::PathBuf {
    let dir = std::path::Path::new("../resources/testdata");
    assert!(dir.is_dir(), "{dir:?} should be a directory");
    dir.to_path_buf()
}

use crate::error::CoreError;
use crate::path::RelativePath;

/// A single uploaded file: the path it was submitted under and its bytes.
///
/// `path` is kept exactly as the client sent it (possibly percent-encoded);
/// use [`UploadedFile::relative_path`] to obtain the normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn relative_path(&self) -> Result<RelativePath, CoreError> {
        RelativePath::parse(&self.path)
    }
}

/// The set of files making up one upload of a prototype.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: Vec<UploadedFile>,
}

impl FileSet {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        Self { files }
    }

    pub fn push(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UploadedFile> {
        self.files.iter()
    }

    /// Total payload size in bytes.
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.content.len()).sum()
    }

    /// Normalizes every path, failing on the first invalid one.
    ///
    /// The returned pairs are in upload order.
    pub fn resolve_paths(&self) -> Result<Vec<(RelativePath, &[u8])>, CoreError> {
        self.files
            .iter()
            .map(|file| Ok((file.relative_path()?, file.content.as_slice())))
            .collect()
    }
}

impl FromIterator<UploadedFile> for FileSet {
    fn from_iter<T: IntoIterator<Item = UploadedFile>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a UploadedFile;
    type IntoIter = std::slice::Iter<'a, UploadedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

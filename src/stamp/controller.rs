use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{StampError, StampResult};
use crate::stamp::export::Exporter;
use crate::stamp::generator::StampGenerator;
use crate::stamp::options::Options;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadRequest {
    pub id: RequestId,
    pub path: PathBuf,
}

pub struct SourceImage {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

/// Drives the pick file → set options → re-render → export pipeline.
pub struct StampController<G> {
    generator: G,
    options: Options,
    image: Option<SourceImage>,
    mesh_text: Option<Arc<str>>,
    pending: Option<ReadRequest>,
    next_request: u64,
    download_enabled: bool,
}

impl<G: StampGenerator> StampController<G> {
    pub fn new(generator: G, options: Options) -> Self {
        Self {
            generator,
            options,
            image: None,
            mesh_text: None,
            pending: None,
            next_request: 0,
            download_enabled: false,
        }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    #[cfg(test)]
    pub fn mesh_text(&self) -> Option<&Arc<str>> {
        self.mesh_text.as_ref()
    }

    pub fn pending(&self) -> Option<&ReadRequest> {
        self.pending.as_ref()
    }

    pub fn download_enabled(&self) -> bool {
        self.download_enabled
    }

    /// Starts reading a newly selected file. Any read still in flight is
    /// superseded and its result will be ignored.
    pub fn select_files(&mut self, paths: &[PathBuf]) -> StampResult<Option<ReadRequest>> {
        match paths {
            [] => Ok(None),
            [path] => {
                self.next_request += 1;
                let request = ReadRequest {
                    id: RequestId(self.next_request),
                    path: path.clone(),
                };
                if let Some(stale) = self.pending.replace(request.clone()) {
                    debug!(request = ?stale.id, "superseded pending read");
                }
                Ok(Some(request))
            }
            _ => Err(StampError::UnexpectedFileCount { count: paths.len() }),
        }
    }

    pub fn accept_read(
        &mut self,
        id: RequestId,
        result: StampResult<Vec<u8>>,
    ) -> StampResult<Option<Arc<str>>> {
        let Some(pending) = self.pending.take_if(|p| p.id == id) else {
            debug!(request = ?id, "discarding stale read");
            return Ok(None);
        };

        let bytes = result?;
        let name = file_name(&pending.path);
        info!(file = %name, bytes = bytes.len(), "image loaded");

        self.image = Some(SourceImage {
            name,
            bytes: bytes.into(),
        });
        // The previous mesh belongs to the previous image.
        self.mesh_text = None;
        self.re_render()
    }

    pub fn set_options(&mut self, options: Options) -> StampResult<Option<Arc<str>>> {
        self.options = options;
        self.re_render()
    }

    /// Regenerates the mesh from the current image and options. Does
    /// nothing until an image has been loaded.
    pub fn re_render(&mut self) -> StampResult<Option<Arc<str>>> {
        let Some(image) = &self.image else {
            return Ok(None);
        };

        self.download_enabled = true;

        self.options.validate()?;
        let text: Arc<str> = self
            .generator
            .generate_from_bytes(&image.bytes, &self.options)?
            .into();

        debug!(bytes = text.len(), options = ?self.options, "mesh generated");
        self.mesh_text = Some(Arc::clone(&text));
        Ok(Some(text))
    }

    pub fn export(&self, exporter: &Exporter) -> StampResult<PathBuf> {
        exporter.check_available()?;

        let (Some(image), Some(text)) = (&self.image, &self.mesh_text) else {
            return Err(StampError::NothingToExport);
        };
        exporter.export(&image.name, text)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewer::{Viewer, ViewerState};
    use parking_lot::Mutex;
    use std::fs;

    /// Records each call and echoes the inputs back as an OBJ comment.
    #[derive(Default)]
    struct EchoGenerator {
        calls: Mutex<Vec<(Vec<u8>, Options)>>,
    }

    impl StampGenerator for &EchoGenerator {
        fn generate_from_bytes(&self, image: &[u8], options: &Options) -> StampResult<String> {
            self.calls.lock().push((image.to_vec(), *options));
            if image.is_empty() {
                return Err(StampError::invalid_options("empty image"));
            }
            Ok(format!(
                "# {} bytes height {}\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
                image.len(),
                options.height_mm
            ))
        }
    }

    struct FailingGenerator;

    impl StampGenerator for FailingGenerator {
        fn generate_from_bytes(&self, _: &[u8], _: &Options) -> StampResult<String> {
            Err(StampError::invalid_options("cannot decode"))
        }
    }

    fn load(controller: &mut StampController<&EchoGenerator>, name: &str, bytes: &[u8]) -> Arc<str> {
        let request = controller
            .select_files(&[PathBuf::from("/images").join(name)])
            .unwrap()
            .unwrap();
        controller
            .accept_read(request.id, Ok(bytes.to_vec()))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn empty_selection_is_a_noop() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());

        assert_eq!(controller.select_files(&[]).unwrap(), None);
        assert!(controller.pending().is_none());
    }

    #[test]
    fn multiple_files_are_rejected() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());

        let err = controller
            .select_files(&[PathBuf::from("a.png"), PathBuf::from("b.png")])
            .unwrap_err();
        assert!(matches!(err, StampError::UnexpectedFileCount { count: 2 }));
        assert_eq!(err.to_string(), "unexpected number of files 2");
    }

    #[test]
    fn re_render_waits_for_an_image() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());

        assert!(controller.re_render().unwrap().is_none());
        assert!(controller.set_options(Options::default().with_invert(false)).unwrap().is_none());
        assert!(!controller.download_enabled());
        assert!(generator.calls.lock().is_empty());
    }

    #[test]
    fn loaded_image_renders_and_enables_download() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());

        let text = load(&mut controller, "photo.png", &[1, 2, 3]);

        assert!(!text.is_empty());
        assert!(controller.download_enabled());
        assert_eq!(controller.image().unwrap().name, "photo.png");
        assert_eq!(controller.mesh_text(), Some(&text));
        assert_eq!(generator.calls.lock().len(), 1);
    }

    #[test]
    fn option_change_replaces_value_and_re_renders() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());
        load(&mut controller, "photo.png", &[1, 2, 3]);

        let next = controller.options().with_height_mm(7.5);
        let text = controller.set_options(next).unwrap().unwrap();

        assert!(text.contains("height 7.5"));
        assert_eq!(controller.options(), next);
        let calls = generator.calls.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, next);
        assert_eq!(calls[1].0, vec![1, 2, 3]);
    }

    #[test]
    fn stale_read_is_discarded() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());

        let first = controller
            .select_files(&[PathBuf::from("first.png")])
            .unwrap()
            .unwrap();
        let second = controller
            .select_files(&[PathBuf::from("second.png")])
            .unwrap()
            .unwrap();
        assert!(second.id > first.id);

        assert!(controller.accept_read(first.id, Ok(vec![9; 10])).unwrap().is_none());
        assert!(controller.image().is_none());

        let text = controller.accept_read(second.id, Ok(vec![1; 4])).unwrap().unwrap();
        assert!(text.starts_with("# 4 bytes"));
        assert_eq!(controller.image().unwrap().name, "second.png");

        // A late duplicate of the completed request is ignored as well.
        assert!(controller.accept_read(second.id, Ok(vec![0; 99])).unwrap().is_none());
        assert_eq!(controller.image().unwrap().bytes.len(), 4);
    }

    #[test]
    fn read_errors_propagate() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());
        let request = controller
            .select_files(&[PathBuf::from("photo.png")])
            .unwrap()
            .unwrap();

        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(controller.accept_read(request.id, Err(err.into())).is_err());
        assert!(controller.image().is_none());
    }

    #[test]
    fn generator_failure_is_reported() {
        let mut controller = StampController::new(FailingGenerator, Options::default());
        let request = controller
            .select_files(&[PathBuf::from("photo.png")])
            .unwrap()
            .unwrap();

        assert!(controller.accept_read(request.id, Ok(vec![1])).is_err());
        assert!(controller.mesh_text().is_none());
        assert!(controller.download_enabled());
    }

    #[test]
    fn invalid_options_are_not_sent_to_generator() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());
        load(&mut controller, "photo.png", &[1]);

        let bad = controller.options().with_max_edge_mm(-1.0);
        assert!(matches!(
            controller.set_options(bad),
            Err(StampError::InvalidOptions { .. })
        ));
        assert_eq!(generator.calls.lock().len(), 1);
    }

    #[test]
    fn export_writes_source_named_obj() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());

        assert!(matches!(
            controller.export(&exporter),
            Err(StampError::NothingToExport)
        ));

        let text = load(&mut controller, "archive.tar.gz", &[1, 2]);
        let path = controller.export(&exporter).unwrap();

        assert_eq!(path, dir.path().join("archive.tar.obj"));
        assert_eq!(fs::read_to_string(path).unwrap(), &*text);
    }

    #[test]
    fn failed_render_of_new_image_leaves_nothing_to_export() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path());
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());
        load(&mut controller, "first.png", &[1, 2]);

        let request = controller
            .select_files(&[PathBuf::from("second.png")])
            .unwrap()
            .unwrap();
        assert!(controller.accept_read(request.id, Ok(Vec::new())).is_err());

        assert_eq!(controller.image().unwrap().name, "second.png");
        assert!(controller.mesh_text().is_none());
        assert!(matches!(
            controller.export(&exporter),
            Err(StampError::NothingToExport)
        ));
        assert!(!dir.path().join("second.obj").exists());
    }

    #[test]
    fn every_render_shows_exactly_one_object() {
        let generator = EchoGenerator::default();
        let mut controller = StampController::new(&generator, Options::default());
        let mut viewer = Viewer::new(960, 800);

        let text = load(&mut controller, "photo.png", &[1, 2, 3]);
        assert!(viewer.load(&text).unwrap());

        for height in [2.0, 4.5, 9.0] {
            let next = controller.options().with_height_mm(height);
            let text = controller.set_options(next).unwrap().unwrap();
            assert!(!viewer.load(&text).unwrap());
            assert_eq!(viewer.scene().object_count(), 1);
        }

        assert_eq!(viewer.state(), ViewerState::Displaying);
        assert_eq!(viewer.scene().revision(), 4);
        assert_eq!(generator.calls.lock().len(), 4);
    }
}

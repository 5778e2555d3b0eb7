pub mod manifest;
pub mod prefix;

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::PrepareError;
use crate::media::mimetype;
use crate::media::runner::CommandRunner;
use crate::media::transcoder::Transcoder;
use self::manifest::{frame_indices, frame_pattern, Manifest};
use self::prefix::frame_prefix;

/// Rasterizes `video` into `<output_dir>/<prefix>_<N>.bmp` and writes the manifest `<output_dir>/<prefix>`.
///
/// Frames are counted from what is on disk after the transcoder returns, so
/// matching files left over from an earlier run are counted too. A transcoder
/// that writes nothing yields an empty manifest, not an error.
pub fn prepare(
    video: &Path,
    output_dir: &Path,
    transcoder: &Transcoder,
    runner: &dyn CommandRunner,
) -> Result<Manifest, PrepareError> {
    let prefix = frame_prefix(video)?;

    if !mimetype::looks_like_video(video) {
        warn!("{:?} does not look like a video file", video);
    }

    fs::create_dir_all(output_dir).map_err(|source| PrepareError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    debug!("Extracting frames of {:?} into {:?}", video, output_dir);
    transcoder.extract_frames(runner, video, &frame_pattern(output_dir, &prefix))?;

    let indices = frame_indices(output_dir, &prefix).map_err(|source| PrepareError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let count = indices.len();
    if indices.iter().copied().ne(1..=count) {
        warn!(
            "Frames for '{}' in {:?} are not numbered 1..={}; manifest may list missing files",
            prefix, output_dir, count
        );
    }

    let manifest = Manifest::numbered(output_dir, &prefix, count);
    manifest.write().map_err(|source| PrepareError::Io {
        path: manifest.path.clone(),
        source,
    })?;

    info!("Prepared {} frames for video {:?}", count, video);
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::manifest::frame_path;
    use crate::testing::FakeRunner;
    use anyhow::Result;

    fn video_in(dir: &Path, name: &str) -> Result<std::path::PathBuf> {
        let path = dir.join(name);
        fs::write(&path, b"not really a video")?;
        Ok(path)
    }

    #[test]
    fn test_manifest_lists_every_frame_in_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let video = video_in(dir.path(), "clip.mpg")?;
        let out = dir.path().join("frames");
        let runner = FakeRunner::new().with_frames(12);

        let manifest = prepare(&video, &out, &Transcoder::new("ffmpeg"), &runner)?;

        assert_eq!(manifest.path, out.join("clip"));
        let lines: Vec<String> = fs::read_to_string(&manifest.path)?
            .lines()
            .map(str::to_string)
            .collect();
        assert_eq!(lines.len(), 12);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line, &frame_path(&out, "clip", i + 1).display().to_string());
        }
        Ok(())
    }

    #[test]
    fn test_transcoder_invoked_once_with_image2_pattern() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let video = video_in(dir.path(), "clip.mpg")?;
        let runner = FakeRunner::new();

        prepare(&video, dir.path(), &Transcoder::new("/opt/ffmpeg"), &runner)?;

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec![
                "/opt/ffmpeg".to_string(),
                "-i".to_string(),
                video.display().to_string(),
                "-f".to_string(),
                "image2".to_string(),
                dir.path().join("clip_%d.bmp").display().to_string(),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_percent_in_video_name_is_passed_escaped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let video = video_in(dir.path(), "50%done.mpg")?;
        let out = dir.path().join("frames");
        let runner = FakeRunner::new().with_frames(2);

        let manifest = prepare(&video, &out, &Transcoder::new("ffmpeg"), &runner)?;

        let pattern = out.join("50%%done_%d.bmp").display().to_string();
        assert_eq!(runner.calls()[0].last(), Some(&pattern));
        assert_eq!(manifest.path, out.join("50%done"));
        assert_eq!(
            manifest.frames,
            vec![out.join("50%done_1.bmp"), out.join("50%done_2.bmp")]
        );
        assert!(out.join("50%done_2.bmp").is_file());
        Ok(())
    }

    #[test]
    fn test_rerun_counts_stray_matching_frames() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let video = video_in(dir.path(), "clip.mpg")?;
        let out = dir.path().join("frames");
        fs::create_dir(&out)?;
        for i in 1..=5 {
            fs::write(frame_path(&out, "clip", i), b"BM")?;
        }
        fs::write(out.join("unrelated_1.bmp"), b"BM")?;

        let runner = FakeRunner::new().with_frames(3);
        let manifest = prepare(&video, &out, &Transcoder::new("ffmpeg"), &runner)?;

        assert_eq!(manifest.len(), 5);
        assert_eq!(Manifest::load(&manifest.path)?.frames, manifest.frames);
        Ok(())
    }

    #[test]
    fn test_failed_transcoder_writes_empty_manifest() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let video = video_in(dir.path(), "clip.mpg")?;
        let runner = FakeRunner::new().with_frames(0).with_transcoder_status(1);

        let manifest = prepare(&video, dir.path(), &Transcoder::new("ffmpeg"), &runner)?;

        assert!(manifest.is_empty());
        assert_eq!(fs::read_to_string(&manifest.path)?, "");
        Ok(())
    }

    #[test]
    fn test_missing_transcoder_is_a_launch_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let video = video_in(dir.path(), "clip.mpg")?;
        let runner = FakeRunner::new().with_missing("ffmpeg");

        let err = prepare(&video, dir.path(), &Transcoder::new("ffmpeg"), &runner).unwrap_err();
        assert!(matches!(err, PrepareError::Launch { .. }));
        Ok(())
    }

    #[test]
    fn test_video_without_extension_is_rejected_before_running_anything() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let video = video_in(dir.path(), "novideoext")?;
        let out = dir.path().join("frames");
        let runner = FakeRunner::new();

        let err = prepare(&video, &out, &Transcoder::new("ffmpeg"), &runner).unwrap_err();

        assert!(matches!(err, PrepareError::InvalidName { .. }));
        assert!(runner.calls().is_empty());
        assert!(!out.exists());
        Ok(())
    }
}

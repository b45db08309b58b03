/*!
 * End-to-end subtitle workflow tests with a scripted backend
 */

use std::sync::Arc;
use anyhow::Result;
use aist::app_controller::{Controller, FileOutcome};
use aist::file_utils::FileManager;
use aist::providers::mock::{MockReply, ScriptedBackend};
use aist::subtitle_processor::{SubtitleDocument, SubtitleFormat};
use crate::common::{self, lines, SAMPLE_ASS};

/// Test translating an SRT file end to end
#[tokio::test]
async fn test_run_withSrtFile_shouldWriteTranslatedFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("out");
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(common::test_config(&output_dir), backend.clone());

    let outcome = controller.run(input, output_dir.clone(), false).await?;

    let output = output_dir.join("movie.srt");
    assert_eq!(outcome, FileOutcome::Translated { output: output.clone(), lines: 3, untranslated: 0, rounds: 1 });
    assert_eq!(backend.call_count(), 1);

    let translated = SubtitleDocument::from_file(&output)?;
    assert_eq!(
        translated.texts(),
        lines(&["ES This is a test subtitle.", "ES It contains\nmultiple lines.", "ES For testing purposes."])
    );
    assert!(FileManager::read_to_string(&output)?.contains("00:00:05,000 --> 00:00:09,000"));
    Ok(())
}

/// Test that an ASS file keeps everything but its dialogue text
#[tokio::test]
async fn test_run_withAssFile_shouldKeepScriptStructure() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_ass(temp_dir.path(), "episode.ass")?;
    let output_dir = temp_dir.path().join("out");
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(common::test_config(&output_dir), backend);

    controller.run(input, output_dir.clone(), false).await?;

    let written = FileManager::read_to_string(output_dir.join("episode.ass"))?;
    assert!(written.contains("Dialogue: 0,0:00:01.00,0:00:04.00,Default,,0,0,0,,ES Hello, world\n"));
    assert!(written.contains("Comment: 0,0:00:04.00,0:00:05.00,Default,,0,0,0,,not translated"));
    assert_eq!(written.lines().count(), SAMPLE_ASS.lines().count());
    assert_eq!(SubtitleDocument::parse(&written, SubtitleFormat::Ass).len(), 2);
    Ok(())
}

/// Test that an unusable backend still produces a complete file with original text
#[tokio::test]
async fn test_run_withFailingBackend_shouldKeepOriginalText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("out");
    let backend = Arc::new(ScriptedBackend::blocking());
    let controller = Controller::with_backend(common::test_config(&output_dir), backend.clone());

    let outcome = controller.run(input.clone(), output_dir.clone(), false).await?;

    match outcome {
        FileOutcome::Translated { untranslated, rounds, .. } => {
            assert_eq!(untranslated, 3);
            assert_eq!(rounds, 4);
        }
        other => panic!("Expected Translated outcome, got {:?}", other),
    }
    assert_eq!(backend.call_count(), 4);

    let original = SubtitleDocument::from_file(&input)?;
    let written = SubtitleDocument::from_file(output_dir.join("movie.srt"))?;
    assert_eq!(written.texts(), original.texts());
    Ok(())
}

/// Test recovery from a truncated first answer
#[tokio::test]
async fn test_run_withTruncatedAnswer_shouldRetryAndComplete() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("out");
    let backend = Arc::new(ScriptedBackend::translating("ES ").with_script(vec![MockReply::Truncate(1)]));
    let controller = Controller::with_backend(common::test_config(&output_dir), backend.clone());

    let outcome = controller.run(input, output_dir, false).await?;

    assert!(matches!(outcome, FileOutcome::Translated { untranslated: 0, rounds: 2, .. }));
    // One line of leading context before the failed cluster
    assert!(backend.requests()[1].starts_with("1\nThis is a test subtitle."));
    Ok(())
}

/// Test that existing output is only replaced when forced
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("out");
    FileManager::write_to_file(output_dir.join("movie.srt"), "old")?;
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(common::test_config(&output_dir), backend.clone());

    let outcome = controller.run(input.clone(), output_dir.clone(), false).await?;
    assert!(matches!(outcome, FileOutcome::Skipped { .. }));
    assert_eq!(backend.call_count(), 0);
    assert_eq!(FileManager::read_to_string(output_dir.join("movie.srt"))?, "old");

    let outcome = controller.run(input, output_dir.clone(), true).await?;
    assert!(matches!(outcome, FileOutcome::Translated { .. }));
    assert_ne!(FileManager::read_to_string(output_dir.join("movie.srt"))?, "old");
    Ok(())
}

/// Test that an empty subtitle file is skipped without a backend call
#[tokio::test]
async fn test_run_withEmptyDocument_shouldSkip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "empty.srt", "\n\n")?;
    let output_dir = temp_dir.path().join("out");
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(common::test_config(&output_dir), backend.clone());

    let outcome = controller.run(input, output_dir.clone(), false).await?;

    assert!(matches!(outcome, FileOutcome::Skipped { .. }));
    assert_eq!(backend.call_count(), 0);
    assert!(!output_dir.join("empty.srt").exists());
    Ok(())
}

/// Test that a "none" target language copies files unchanged
#[tokio::test]
async fn test_run_withTranslationDisabled_shouldCopyFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.srt")?;
    let output_dir = temp_dir.path().join("out");
    let mut config = common::test_config(&output_dir);
    config.target_language = "none".to_string();
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(config, backend.clone());

    let outcome = controller.run(input.clone(), output_dir.clone(), false).await?;

    assert_eq!(outcome, FileOutcome::Copied { output: output_dir.join("movie.srt") });
    assert_eq!(backend.call_count(), 0);
    assert_eq!(
        FileManager::read_to_string(output_dir.join("movie.srt"))?,
        FileManager::read_to_string(&input)?
    );
    Ok(())
}

/// Test that a missing input file is an error
#[tokio::test]
async fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(common::test_config(temp_dir.path()), backend);

    let result = controller.run(temp_dir.path().join("missing.srt"), temp_dir.path().join("out"), false).await;
    assert!(result.is_err());
    Ok(())
}

/// Test folder processing across formats, with one broken file
#[tokio::test]
async fn test_run_folder_withMixedFiles_shouldProcessEachAndCountErrors() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    std::fs::create_dir(&input_dir)?;
    common::create_test_subtitle(&input_dir, "one.srt")?;
    common::create_test_ass(&input_dir, "two.ass")?;
    common::create_test_file(&input_dir, "empty.srt", "")?;
    common::create_test_file(&input_dir, "readme.txt", "not a subtitle")?;
    let output_dir = temp_dir.path().join("out");
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(common::test_config(&output_dir), backend);

    let summary = controller.run_folder(input_dir, output_dir.clone(), false, false).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors, 0);
    assert!(output_dir.join("one.srt").exists());
    assert!(output_dir.join("two.ass").exists());
    assert!(!output_dir.join("readme.txt").exists());
    Ok(())
}

/// Test that same-named files in different subdirectories get separate outputs
#[tokio::test]
async fn test_run_folder_withSameNamesInSubdirs_shouldMirrorLayout() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    std::fs::create_dir_all(input_dir.join("s1"))?;
    std::fs::create_dir_all(input_dir.join("s2"))?;
    common::create_test_subtitle(&input_dir.join("s1"), "ep.srt")?;
    common::create_test_subtitle(&input_dir.join("s2"), "ep.srt")?;
    let output_dir = temp_dir.path().join("out");
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(common::test_config(&output_dir), backend.clone());

    let summary = controller.run_folder(input_dir, output_dir.clone(), false, true).await?;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(backend.call_count(), 2);
    assert!(output_dir.join("s1").join("ep.srt").exists());
    assert!(output_dir.join("s2").join("ep.srt").exists());
    assert!(!output_dir.join("ep.srt").exists());
    Ok(())
}

/// Test that a second recursive run does not pick up its own outputs
#[tokio::test]
async fn test_run_folder_withOutputInsideInput_shouldNotReprocessOutputs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().to_path_buf();
    common::create_test_subtitle(&input_dir, "movie.srt")?;
    let output_dir = input_dir.join("output");
    let backend = Arc::new(ScriptedBackend::translating("ES "));
    let controller = Controller::with_backend(common::test_config(&output_dir), backend.clone());

    let first = controller.run_folder(input_dir.clone(), output_dir.clone(), false, true).await?;
    let second = controller.run_folder(input_dir, output_dir.clone(), false, true).await?;

    assert_eq!(first.processed, 1);
    assert_eq!(second.processed + second.skipped + second.errors, 1);
    assert_eq!(second.skipped, 1);
    assert!(!output_dir.join("output").exists());
    Ok(())
}

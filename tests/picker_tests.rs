// Integration tests for source enumeration and selection

mod common;

use anyhow::Result;
use common::{sources, ScriptedHost};
use desk_recorder::{Error, SourceKind, SourcePicker, Terminal};

#[tokio::test]
async fn test_menu_has_one_item_per_source_labelled_by_name() -> Result<()> {
    let host = ScriptedHost::new(sources());
    let listed = SourcePicker::default().list_sources(&host).await?;

    let labels: Vec<String> = SourcePicker::build_menu(&listed)
        .into_iter()
        .map(|item| item.label)
        .collect();

    assert_eq!(labels, vec!["Screen 1", "Window A"]);
    Ok(())
}

#[tokio::test]
async fn test_pick_returns_chosen_source() -> Result<()> {
    let host = ScriptedHost::new(sources());
    let mut terminal = Terminal::scripted(["1"], Vec::<u8>::new());

    let picked = SourcePicker::default().pick(&host, &mut terminal).await?;

    assert_eq!(picked, Some(sources().remove(0)));
    Ok(())
}

#[tokio::test]
async fn test_dismissed_menu_returns_none() -> Result<()> {
    let host = ScriptedHost::new(sources());
    let mut terminal = Terminal::scripted(Vec::<String>::new(), Vec::<u8>::new());

    let picked = SourcePicker::default().pick(&host, &mut terminal).await?;

    assert!(picked.is_none());
    Ok(())
}

#[tokio::test]
async fn test_picker_restricted_to_kinds() -> Result<()> {
    let host = ScriptedHost::new(sources());

    let windows = SourcePicker::new(vec![SourceKind::Window])
        .list_sources(&host)
        .await?;

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].name, "Window A");
    Ok(())
}

#[tokio::test]
async fn test_find_by_id_or_name() -> Result<()> {
    let host = ScriptedHost::new(sources());
    let picker = SourcePicker::default();

    assert_eq!(
        picker.find(&host, "window a").await?.map(|s| s.id),
        Some("window:0x05000001".to_string())
    );
    assert_eq!(
        picker.find(&host, "screen:0").await?.map(|s| s.name),
        Some("Screen 1".to_string())
    );
    assert!(picker.find(&host, "Window B").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_enumeration_failure_is_platform_query_error() {
    let host = ScriptedHost::new(sources()).denying_query();
    let mut terminal = Terminal::scripted(["1"], Vec::<u8>::new());

    let err = SourcePicker::default()
        .pick(&host, &mut terminal)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PlatformQuery(_)));
}

use literate::protocol::{BlockKind, Directive, ProtocolError, resolve};

fn file(path: &str) -> BlockKind {
    BlockKind::File {
        path: Some(path.to_string()),
    }
}

#[test]
fn missing_meta_is_an_unnamed_file() {
    assert_eq!(resolve(None), Ok(BlockKind::File { path: None }));
}

#[test]
fn unknown_protocols_are_unnamed_files() {
    assert_eq!(resolve(Some("invalid://test")), Ok(BlockKind::File { path: None }));
    assert_eq!(resolve(Some("https://example.com")), Ok(BlockKind::File { path: None }));
}

#[test]
fn file_protocol_names_the_path() {
    assert_eq!(resolve(Some("file://path/to/file")), Ok(file("path/to/file")));
    assert_eq!(resolve(Some("before file://path/to/file after")), Ok(file("path/to/file")));
    assert_eq!(resolve(Some("#id file://x.ts")), Ok(file("x.ts")));
}

#[test]
fn protocol_must_start_a_token() {
    assert_eq!(resolve(Some("myfile://x.ts")), Ok(BlockKind::File { path: None }));
}

#[test]
fn first_protocol_token_wins() {
    assert_eq!(resolve(Some("file://a.sh rmsm://startup")), Ok(file("a.sh")));
    assert_eq!(
        resolve(Some("rmsm://startup file://a.sh")),
        Ok(BlockKind::Directive(Directive::Startup))
    );
}

#[test]
fn startup_directive() {
    assert_eq!(resolve(Some("rmsm://startup")), Ok(BlockKind::Directive(Directive::Startup)));
}

#[test]
fn unknown_directive_is_an_error() {
    let err = resolve(Some("rmsm://some/path")).unwrap_err();
    assert_eq!(err, ProtocolError::InvalidDirective("some/path".to_string()));
    assert_eq!(err.to_string(), "Invalid rmsm protocol value: some/path");
}

#[test]
fn directives_round_trip_through_their_names() {
    for directive in Directive::ALL {
        assert_eq!(directive.as_str().parse::<Directive>(), Ok(*directive));
    }
}

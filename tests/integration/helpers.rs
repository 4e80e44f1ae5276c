use recgate::host::DocumentId;
use recgate::suggestions::{
    ContentChange, Dispatch, FetchRequest, HostEvent, ManualTrigger, TextChange,
};

pub const DOC: &str = "file:///workspace/app.py";

pub fn manual(document: &str, line: u32) -> HostEvent {
    HostEvent::InvokeSuggestion(ManualTrigger {
        document: DocumentId::new(document),
        language: "python".to_string(),
        line,
    })
}

pub fn keystroke(document: &str, language: &str, text: &str) -> HostEvent {
    HostEvent::TextChanged(TextChange {
        document: DocumentId::new(document),
        language: language.to_string(),
        line: 10,
        changes: vec![ContentChange {
            text: text.to_string(),
            range_length: 0,
        }],
    })
}

pub fn focus(document: &str) -> HostEvent {
    HostEvent::ActiveEditorChanged {
        document: Some(DocumentId::new(document)),
    }
}

pub fn expect_fetch(dispatch: Dispatch) -> FetchRequest {
    match dispatch {
        Dispatch::Fetch(request) => request,
        other => panic!("expected a fetch request, got {other:?}"),
    }
}

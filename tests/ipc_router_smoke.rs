mod test_support;

use serde_json::json;
use std::io::Write;
use test_support::{read_response, request, request_err, spawn_sidecar, temp_dir};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("marksheetd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], true);
    assert_eq!(health["result"]["workspacePath"], serde_json::Value::Null);

    let code = request_err(&mut stdin, &mut reader, "2", "students.list", json!({ "year": 2025, "section": "C" }));
    assert_eq!(code, "no_workspace");

    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert!(workspace.join("marksheets.sqlite3").exists());

    let key = json!({ "year": 2025, "section": "C", "subject": "MATH", "evaluation": 1 });
    let calls = [
        ("auth.register", json!({ "fullName": "Rina Das", "subject": "MATH", "password": "pw" })),
        ("auth.login", json!({ "uniqueId": "RIDA_MATH_1", "password": "pw" })),
        ("admin.logout", json!({ "sessionToken": "none" })),
        ("admin.notices", json!({ "sessionToken": "none" })),
        ("teachers.list", json!({})),
        ("teachers.resetPassword", json!({ "uniqueId": "RIDA_MATH_1", "password": "pw2" })),
        ("students.set", json!({ "year": 2025, "section": "C", "students": [{ "roll": 1, "name": "Asha" }] })),
        ("students.upload", json!({ "year": 2025, "section": "C", "names": "Asha, Bina" })),
        ("students.rename", json!({ "year": 2025, "section": "C", "roll": 1, "name": "Asha K" })),
        ("students.list", json!({ "year": 2025, "section": "C" })),
        ("marks.get", key.clone()),
        ("marks.save", json!({ "year": 2025, "section": "C", "subject": "MATH", "evaluation": 1, "status": "draft", "entries": {} })),
        ("marks.updateCell", json!({ "year": 2025, "section": "C", "subject": "MATH", "evaluation": 1, "roll": 1, "field": "written", "value": "30" })),
        ("marks.listSection", json!({ "year": 2025, "section": "C" })),
        ("marks.consolidated", json!({ "year": 2025, "section": "C" })),
        ("marks.subjectView", json!({ "year": 2025, "section": "C", "subject": "MATH" })),
        ("unlock.list", json!({ "status": "pending" })),
        ("unlock.create", json!({ "teacherName": "Rina Das", "year": 2025, "section": "C", "subject": "MATH", "evaluation": 1 })),
        ("unlock.approve", json!({ "id": "missing" })),
        ("unlock.deny", json!({ "id": "missing" })),
        ("unlock.delete", json!({ "id": "missing" })),
        ("students.delete", json!({ "year": 2025, "section": "C", "roll": 2 })),
        ("teachers.delete", json!({ "uniqueId": "RIDA_MATH_1" })),
        ("stats.overview", json!({})),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let id = format!("m{i}");
        let resp = request(&mut stdin, &mut reader, &id, method, params);
        if resp["ok"] == false {
            assert_ne!(
                resp["error"]["code"], "not_implemented",
                "unexpected unknown method for {}",
                method
            );
        }
    }

    let code = request_err(&mut stdin, &mut reader, "u", "grades.export", json!({}));
    assert_eq!(code, "not_implemented");

    let code = request_err(&mut stdin, &mut reader, "s", "unlock.list", json!({ "status": "denied" }));
    assert_eq!(code, "bad_params");

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush");
    let bad = read_response(&mut reader);
    assert_eq!(bad["ok"], false);
    assert_eq!(bad["error"]["code"], "bad_json");

    drop(stdin);
    let status = child.wait().expect("wait for sidecar");
    assert!(status.success());
}

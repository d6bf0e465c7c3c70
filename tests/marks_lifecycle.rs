mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, select_workspace, spawn_sidecar};

fn sheet(extra: serde_json::Value) -> serde_json::Value {
    let mut params = json!({
        "year": 2025,
        "section": "C",
        "subject": "MATH",
        "evaluation": "1",
    });
    if let (Some(p), Some(e)) = (params.as_object_mut(), extra.as_object()) {
        for (k, v) in e {
            p.insert(k.clone(), v.clone());
        }
    }
    params
}

#[test]
fn submit_unlock_and_approve_round_trip() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "marksheetd-lifecycle");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.upload",
        json!({ "year": 2025, "section": "C", "names": "Asha, Bina" }),
    );

    let fresh = request_ok(&mut stdin, &mut reader, "2", "marks.get", sheet(json!({})));
    assert_eq!(fresh["sheet"]["status"], "new");
    assert_eq!(fresh["controls"]["editable"], true);
    assert_eq!(fresh["missingRolls"], json!([1, 2]));

    let submitted = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "marks.save",
        sheet(json!({
            "status": "submitted",
            "entries": { "1": { "written": "30", "practical": "8" } },
        })),
    );
    assert_eq!(submitted["status"], "submitted");
    assert_eq!(submitted["previousStatus"], "new");
    assert_eq!(submitted["missingRolls"], json!([2]));

    // Locked: teacher cell edits are refused.
    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "marks.updateCell",
        sheet(json!({ "roll": 2, "field": "W", "value": "12" })),
    );
    assert_eq!(code, "conflict");

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "unlock.create",
        sheet(json!({ "teacherName": "Rina Das" })),
    );
    let request_id = created["request"]["id"].as_str().expect("id").to_string();
    assert_eq!(created["request"]["status"], "pending");
    assert_eq!(created["request"]["evaluation"], "1");
    assert_eq!(created["request"]["evolution"], "1");

    let still_locked = request_ok(&mut stdin, &mut reader, "6", "marks.get", sheet(json!({})));
    assert_eq!(still_locked["sheet"]["status"], "submitted");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "unlock.create",
        sheet(json!({ "teacherName": "Rina Das" })),
    );
    assert_eq!(code, "conflict");

    let pending = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "marks.save",
        sheet(json!({
            "status": "pending_unlock",
            "entries": { "1": { "written": "30", "practical": "8" } },
        })),
    );
    assert_eq!(pending["status"], "pending_unlock");

    let view = request_ok(&mut stdin, &mut reader, "9", "marks.get", sheet(json!({})));
    assert_eq!(view["controls"]["unlockRequestDisabled"], true);
    assert_eq!(view["controls"]["canSubmit"], false);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "10",
        "marks.save",
        sheet(json!({ "status": "submitted", "entries": {} })),
    );
    assert_eq!(code, "conflict");

    let approved = request_ok(
        &mut stdin,
        &mut reader,
        "11",
        "unlock.approve",
        json!({ "id": request_id }),
    );
    assert_eq!(approved["status"], "draft");
    assert_eq!(approved["previousStatus"], "pending_unlock");

    let queue = request_ok(&mut stdin, &mut reader, "12", "unlock.list", json!({}));
    assert_eq!(queue["requests"], json!([]));

    let reopened = request_ok(&mut stdin, &mut reader, "13", "marks.get", sheet(json!({})));
    assert_eq!(reopened["sheet"]["status"], "draft");
    assert_eq!(reopened["sheet"]["entries"]["1"]["written"], "30");

    let edited = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "marks.updateCell",
        sheet(json!({ "roll": 2, "field": "practical", "value": "9" })),
    );
    assert_eq!(edited["status"], "draft");
}

#[test]
fn denial_leaves_sheet_locked_and_allows_a_new_request() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "marksheetd-deny");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "marks.save",
        sheet(json!({ "status": "submitted", "entries": {} })),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "unlock.create",
        sheet(json!({ "teacherName": "Rina Das" })),
    );
    let id = created["request"]["id"].as_str().expect("id").to_string();

    let _ = request_ok(&mut stdin, &mut reader, "3", "unlock.deny", json!({ "id": id }));
    let code = request_err(&mut stdin, &mut reader, "4", "unlock.deny", json!({ "id": id }));
    assert_eq!(code, "not_found");

    let view = request_ok(&mut stdin, &mut reader, "5", "marks.get", sheet(json!({})));
    assert_eq!(view["sheet"]["status"], "submitted");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "unlock.create",
        sheet(json!({ "teacherName": "Rina Das" })),
    );
}

#[test]
fn unlock_request_needs_a_locked_sheet() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "marksheetd-unlock-draft");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "unlock.create",
        sheet(json!({ "teacherName": "Rina Das" })),
    );
    assert_eq!(code, "bad_params");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.save",
        sheet(json!({ "status": "draft", "entries": {} })),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "unlock.create",
        sheet(json!({ "teacherName": "Rina Das" })),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "marks.save",
        sheet(json!({ "status": "pending_unlock", "entries": {} })),
    );
    assert_eq!(code, "conflict");
}

#[test]
fn save_reports_bounds_warnings_without_rejecting() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "marksheetd-bounds");

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "marks.save",
        sheet(json!({
            "status": "draft",
            "entries": {
                "1": { "written": "45", "practical": "8" },
                "2": { "written": "40", "practical": "11" },
            },
        })),
    );
    let warnings = saved["warnings"].as_array().expect("warnings");
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0]["roll"], 1);
    assert_eq!(warnings[0]["field"], "written");
    assert_eq!(warnings[1]["roll"], 2);
    assert_eq!(warnings[1]["field"], "practical");

    let final_eval = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.save",
        sheet(json!({
            "evaluation": 3,
            "status": "draft",
            "entries": { "1": { "written": "85", "practical": "10" } },
        })),
    );
    assert_eq!(final_eval["warnings"], json!([]));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "marks.save",
        sheet(json!({ "status": "new", "entries": {} })),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "marks.save",
        json!({ "year": 2025, "subject": "MATH", "evaluation": 1, "status": "draft" }),
    );
    assert_eq!(code, "bad_params");
}

#[test]
fn save_without_entries_is_rejected_and_keeps_stored_marks() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select_workspace(&mut stdin, &mut reader, "marksheetd-save-no-entries");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "marks.save",
        sheet(json!({
            "status": "submitted",
            "entries": { "1": { "written": "30", "practical": "8" } },
        })),
    );

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "marks.save",
        sheet(json!({ "status": "pending_unlock" })),
    );
    assert_eq!(code, "bad_params");
    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "marks.save",
        sheet(json!({ "status": "pending_unlock", "entries": null })),
    );
    assert_eq!(code, "bad_params");

    let kept = request_ok(&mut stdin, &mut reader, "4", "marks.get", sheet(json!({})));
    assert_eq!(kept["sheet"]["status"], "submitted");
    assert_eq!(
        kept["sheet"]["entries"],
        json!({ "1": { "written": "30", "practical": "8" } })
    );

    // An explicit empty object still clears the sheet.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "marks.save",
        sheet(json!({ "status": "draft", "entries": {} })),
    );
    let cleared = request_ok(&mut stdin, &mut reader, "6", "marks.get", sheet(json!({})));
    assert_eq!(cleared["sheet"]["entries"], json!({}));
}

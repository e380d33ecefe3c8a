use http_client::Request;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Add the headers every web service POST carries
pub fn add_submission_headers(request: &mut Request, user_agent: &str) {
    let _ = request.insert_header("User-Agent", user_agent);
    let _ = request.insert_header("Accept-Charset", "utf-8");
    let _ = request.insert_header("Content-Type", FORM_CONTENT_TYPE);
}

use crate::core::Res;

/// Read the full response body and parse it.
///
/// A body that fails to arrive completely is reported as an error so the
/// caller can retry the attempt.
pub(crate) async fn read_res(resp: reqwest::Response) -> Result<Res, reqwest::Error> {
    let text = resp.text().await?;
    Ok(Res::parse(text))
}

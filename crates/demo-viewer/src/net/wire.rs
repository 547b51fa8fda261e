//! JSON bodies exchanged with the backend, and the checks applied to its
//! answers before anything reaches the scene.

use super::{EpisodeSource, LoadError};
use episode::FrameSequence;
use serde::{Deserialize, Serialize};

pub const LOAD_ZARR: &str = "load_zarr";
pub const SHOW_EPISODE: &str = "show_episode";
pub const LOAD_MESH: &str = "load_mesh";
pub const SAVE_POSE: &str = "save_gizmo_pose";

#[derive(Debug, Serialize)]
pub struct LoadZarrBody<'a> {
    pub path: &'a str,
    pub traj_id: usize,
}

#[derive(Debug, Serialize)]
pub struct ShowEpisodeBody {
    pub episode_id: usize,
}

#[derive(Debug, Serialize)]
pub struct LoadMeshBody<'a> {
    pub file_path: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SavePoseBody {
    pub pose: [f32; 7],
    pub frame: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct LoadZarrReply {
    success: bool,
    error: Option<String>,
    point_cloud_data: Option<Vec<Vec<f32>>>,
    episode_count: Option<usize>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShowEpisodeReply {
    success: bool,
    error: Option<String>,
    episode_data: Option<Vec<Vec<f32>>>,
}

#[derive(Debug, Deserialize)]
struct StatusReply {
    success: bool,
    error: Option<String>,
}

fn server_error(error: Option<String>, fallback: &str) -> LoadError {
    LoadError::Server(error.unwrap_or_else(|| fallback.to_owned()))
}

/// `/load_zarr` answer: either frames or an episode count.
pub fn decode_load_zarr(body: &[u8]) -> Result<EpisodeSource, LoadError> {
    let reply: LoadZarrReply = serde_json::from_slice(body)?;
    if !reply.success {
        return Err(server_error(reply.error, "Loading failed"));
    }
    if let Some(msg) = &reply.message {
        log::info!("Backend: {msg}");
    }

    match (reply.point_cloud_data, reply.episode_count) {
        (Some(frames), _) => Ok(EpisodeSource::Frames(FrameSequence::from_frames(frames)?)),
        (None, Some(count)) if count > 0 => Ok(EpisodeSource::Episodes { count }),
        (None, Some(_)) => Err(LoadError::Server("file holds no episodes".to_owned())),
        (None, None) => Err(LoadError::Server(
            "reply carried neither point_cloud_data nor episode_count".to_owned(),
        )),
    }
}

/// `/show_episode` answer.
pub fn decode_show_episode(body: &[u8]) -> Result<FrameSequence, LoadError> {
    let reply: ShowEpisodeReply = serde_json::from_slice(body)?;
    if !reply.success {
        return Err(server_error(reply.error, "Loading failed"));
    }
    let frames = reply
        .episode_data
        .ok_or_else(|| LoadError::Server("reply carried no episode_data".to_owned()))?;
    Ok(FrameSequence::from_frames(frames)?)
}

/// `/save_gizmo_pose` answer.
pub fn decode_save_pose(body: &[u8]) -> Result<(), LoadError> {
    let reply: StatusReply = serde_json::from_slice(body)?;
    if reply.success {
        Ok(())
    } else {
        Err(server_error(reply.error, "pose was not saved"))
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("application/json"))
}

/// Passes the body of a 2xx answer through. Anything else becomes the
/// server's own `error` text when it sent one, or the bare status.
pub fn check_status(
    status: u16,
    content_type: Option<&str>,
    body: Vec<u8>,
) -> Result<Vec<u8>, LoadError> {
    if (200..300).contains(&status) {
        return Ok(body);
    }
    if is_json(content_type) {
        if let Ok(StatusReply {
            error: Some(error), ..
        }) = serde_json::from_slice::<StatusReply>(&body)
        {
            return Err(LoadError::Server(error));
        }
    }
    Err(LoadError::HttpStatus(status))
}

/// `/load_mesh` answer: the raw file, unless the server sent JSON instead.
pub fn decode_file(
    status: u16,
    content_type: Option<&str>,
    body: Vec<u8>,
) -> Result<Vec<u8>, LoadError> {
    let body = check_status(status, content_type, body)?;

    if is_json(content_type) {
        let reply: StatusReply = serde_json::from_slice(&body)?;
        if !reply.success {
            return Err(server_error(reply.error, "Unknown error"));
        }
        return Err(LoadError::UnexpectedJson);
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zarr_frames() {
        let body = br#"{"success":true,"point_cloud_data":[[0,0,0,1,1,1],[1,1,1,0,0,0]],
                        "frames":2,"points_per_frame":1,"features":6,"message":"ok"}"#;
        match decode_load_zarr(body).unwrap() {
            EpisodeSource::Frames(seq) => {
                assert_eq!(seq.len(), 2);
                assert_eq!(seq.points_per_frame(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zarr_episode_count() {
        let body = br#"{"success":true,"episode_count":12}"#;
        assert!(matches!(
            decode_load_zarr(body).unwrap(),
            EpisodeSource::Episodes { count: 12 }
        ));
    }

    #[test]
    fn zarr_server_error_text_is_kept() {
        let body = br#"{"success":false,"error":"path is invalid: /nope"}"#;
        let err = decode_load_zarr(body).unwrap_err();
        assert_eq!(err.to_string(), "Server error: path is invalid: /nope");

        let err = decode_load_zarr(br#"{"success":false}"#).unwrap_err();
        assert_eq!(err.to_string(), "Server error: Loading failed");
    }

    #[test]
    fn zarr_bad_shape_is_rejected() {
        let body = br#"{"success":true,"point_cloud_data":[[0,0,0,1,1]]}"#;
        assert!(matches!(
            decode_load_zarr(body),
            Err(LoadError::Data(episode::DataError::BadStride { .. }))
        ));
    }

    #[test]
    fn show_episode() {
        let body = br#"{"success":true,"episode_data":[[0,0,0,255,0,0]]}"#;
        let seq = decode_show_episode(body).unwrap();
        assert!(seq.rescaled_colors());
        assert!(decode_show_episode(br#"{"success":true}"#).is_err());
    }

    #[test]
    fn save_pose_reply() {
        assert!(decode_save_pose(br#"{"success":true}"#).is_ok());
        assert!(decode_save_pose(br#"{"success":false}"#).is_err());
        assert!(matches!(decode_save_pose(b"<html>"), Err(LoadError::Decode(_))));
    }

    #[test]
    fn save_pose_body_shape() {
        let body = SavePoseBody {
            pose: [1.0, 2.0, 3.0, 1.0, 0.0, 0.0, 0.0],
            frame: -1,
            scale: None,
            timestamp: 42,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["frame"], -1);
        assert_eq!(json["pose"][3], 1.0);
        assert!(json.get("scale").is_none());

        let scaled = SavePoseBody {
            scale: Some(2.0),
            ..body
        };
        assert_eq!(serde_json::to_value(&scaled).unwrap()["scale"], 2.0);
    }

    #[test]
    fn file_reply_variants() {
        let bytes = b"v 0 0 0\n".to_vec();
        assert_eq!(
            decode_file(200, Some("application/octet-stream"), bytes.clone()).unwrap(),
            bytes
        );

        let err = decode_file(
            404,
            Some("application/json"),
            br#"{"success":false,"error":"File not found"}"#.to_vec(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Server error: File not found");

        let err = decode_file(500, Some("text/html"), b"boom".to_vec()).unwrap_err();
        assert_eq!(err.to_string(), "HTTP error: 500");
    }

    #[test]
    fn non_ok_status_wins_over_body() {
        let err = check_status(502, Some("text/html"), b"<html>bad gateway</html>".to_vec())
            .unwrap_err();
        assert!(matches!(err, LoadError::HttpStatus(502)));

        let err = check_status(500, Some("application/json"), br#"{"success":true}"#.to_vec())
            .unwrap_err();
        assert!(matches!(err, LoadError::HttpStatus(500)));

        let err = check_status(
            400,
            Some("application/json; charset=utf-8"),
            br#"{"success":false,"error":"path is invalid"}"#.to_vec(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Server error: path is invalid");

        assert_eq!(check_status(200, None, b"{}".to_vec()).unwrap(), b"{}");

        let err = decode_file(200, Some("application/json"), br#"{"success":true}"#.to_vec())
            .unwrap_err();
        assert!(matches!(err, LoadError::UnexpectedJson));
    }
}

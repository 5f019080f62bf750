use std::{io::Read, path::Path};

use log::info;
use rouille::{Request, Response};

use crate::{
    config::HttpConfig,
    domain::media::{MediaFile, media_type_for},
    handles::HandleRegistry,
    http::error::ApiError,
    library::DEFAULT_PLAYLIST,
    session::{Command, Event, SessionHandle},
    view::LibraryView,
};

/// Local surface of the player: the page posts its events here and renders the returned view
pub struct HttpServer {
    session: SessionHandle,
    handles: HandleRegistry,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(session: SessionHandle, handles: HandleRegistry, config: HttpConfig) -> Self {
        Self {
            session,
            handles,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let result = rouille::router!(request,
            (GET) (/state) => {
                self.post(Event::View { query: request.get_param("q") })
            },
            (POST) (/commands) => {
                self.handle_command(request)
            },
            (POST) (/upload) => {
                self.handle_upload(request)
            },
            (POST) (/cover) => {
                self.handle_cover(request)
            },
            (PUT) (/background) => {
                Self::read_file(request, "background")
                    .and_then(|image| self.post(Event::Background(image)))
            },
            (DELETE) (/background) => {
                self.post(Event::Command(Command::ResetBackground))
            },
            (GET) (/media/{token: String}) => {
                self.handle_media(&token)
            },
            _ => Err(ApiError::NotFound(format!("no route for {}", request.url())))
        );

        let response = result.unwrap_or_else(ApiError::into_response);
        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn post(&self, event: Event) -> Result<Response, ApiError> {
        let view: LibraryView = self.session.send(event)?;
        Ok(Response::json(&view))
    }

    fn handle_command(&self, request: &Request) -> Result<Response, ApiError> {
        let command: Command = rouille::input::json_input(request)
            .map_err(|e| ApiError::BadRequest(format!("invalid command: {e}")))?;
        log::debug!("command {command:?}");
        self.post(Event::Command(command))
    }

    fn handle_upload(&self, request: &Request) -> Result<Response, ApiError> {
        let file_name = Self::required_param(request, "filename")?;
        let playlist = request
            .get_param("playlist")
            .unwrap_or_else(|| DEFAULT_PLAYLIST.to_string());
        let file = Self::read_file(request, &file_name)?;
        self.post(Event::Upload {
            playlist,
            files: vec![file],
        })
    }

    fn handle_cover(&self, request: &Request) -> Result<Response, ApiError> {
        let playlist = Self::required_param(request, "playlist")?;
        let index = Self::required_param(request, "index")?
            .parse::<usize>()
            .map_err(|_| ApiError::BadRequest("index must be a non-negative integer".into()))?;
        let image = Self::read_file(request, "cover")?;
        self.post(Event::Cover {
            playlist,
            index,
            image,
        })
    }

    fn handle_media(&self, token: &str) -> Result<Response, ApiError> {
        let payload = self
            .handles
            .resolve(token)
            .ok_or_else(|| ApiError::NotFound(format!("media {token} is not available")))?;
        Ok(Response::from_data(
            payload.media_type().to_string(),
            payload.bytes().to_vec(),
        ))
    }

    fn required_param(request: &Request, name: &str) -> Result<String, ApiError> {
        request
            .get_param(name)
            .ok_or_else(|| ApiError::BadRequest(format!("missing parameter '{name}'")))
    }

    /// Raw request body as a file, typed by its Content-Type or else by the file name
    fn read_file(request: &Request, file_name: &str) -> Result<MediaFile, ApiError> {
        let mut body = request
            .data()
            .ok_or_else(|| ApiError::BadRequest("request body was already read".into()))?;
        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes)
            .map_err(|e| ApiError::BadRequest(format!("could not read request body: {e}")))?;

        let media_type = request
            .header("Content-Type")
            .map(|t| t.split(';').next().unwrap_or(t).trim().to_lowercase())
            .filter(|t| !t.is_empty() && t != "application/octet-stream")
            .unwrap_or_else(|| media_type_for(Path::new(file_name)));
        Ok(MediaFile::new(file_name, media_type, bytes))
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}

// MIT License
// Copyright 2023--present additive developers

//! Raw async calls of the additive gRPC services.
//!
//! Written against `tonic::client::Grpc` directly, the way generated clients
//! are, so the crate needs no `protoc` at build time.

use std::collections::HashMap;

use futures::Stream;
use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Status};

use crate::proto;

const SIMULATE: &str = "/ansys.api.additive.v0.SimulationService/Simulate";
const TUNE_MATERIAL: &str = "/ansys.api.additive.v0.SimulationService/TuneMaterial";
const UPLOAD_FILE: &str = "/ansys.api.additive.v0.SimulationService/UploadFile";
const DOWNLOAD_FILE: &str = "/ansys.api.additive.v0.SimulationService/DownloadFile";
const GET_MATERIALS_LIST: &str = "/ansys.api.additive.v0.MaterialsService/GetMaterialsList";
const GET_MATERIAL: &str = "/ansys.api.additive.v0.MaterialsService/GetMaterial";
const ABOUT: &str = "/ansys.api.additive.v0.AboutService/About";

/// Largest content slice sent in one upload message.
pub const UPLOAD_CHUNK_SIZE: usize = 1 << 20;

/// Client of the simulation, materials and about services over one channel.
#[derive(Debug, Clone)]
pub struct AdditiveStub {
    inner: tonic::client::Grpc<Channel>,
}

impl AdditiveStub {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn ready(&mut self) -> Result<(), Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {e}")))
    }

    pub async fn simulate(
        &mut self,
        request: proto::SimulationRequest,
    ) -> Result<Streaming<proto::SimulationResponse>, Status> {
        self.ready().await?;
        let path = PathAndQuery::from_static(SIMULATE);
        let response = self
            .inner
            .server_streaming(Request::new(request), path, ProstCodec::default())
            .await?;
        Ok(response.into_inner())
    }

    pub async fn tune_material(
        &mut self,
        request: proto::MaterialTuningRequest,
    ) -> Result<Streaming<proto::MaterialTuningResponse>, Status> {
        self.ready().await?;
        let path = PathAndQuery::from_static(TUNE_MATERIAL);
        let response = self
            .inner
            .server_streaming(Request::new(request), path, ProstCodec::default())
            .await?;
        Ok(response.into_inner())
    }

    /// Send `chunks` and stream back upload progress.
    pub async fn upload_file<S>(
        &mut self,
        chunks: S,
    ) -> Result<Streaming<proto::UploadFileResponse>, Status>
    where
        S: Stream<Item = proto::UploadFileRequest> + Send + 'static,
    {
        self.ready().await?;
        let path = PathAndQuery::from_static(UPLOAD_FILE);
        let response = self
            .inner
            .streaming(Request::new(chunks), path, ProstCodec::default())
            .await?;
        Ok(response.into_inner())
    }

    pub async fn download_file(
        &mut self,
        remote_file_name: &str,
    ) -> Result<Streaming<proto::DownloadFileResponse>, Status> {
        self.ready().await?;
        let request = proto::DownloadFileRequest {
            remote_file_name: remote_file_name.to_string(),
        };
        let path = PathAndQuery::from_static(DOWNLOAD_FILE);
        let response = self
            .inner
            .server_streaming(Request::new(request), path, ProstCodec::default())
            .await?;
        Ok(response.into_inner())
    }

    pub async fn get_materials_list(&mut self) -> Result<Vec<String>, Status> {
        self.ready().await?;
        let path = PathAndQuery::from_static(GET_MATERIALS_LIST);
        let response: tonic::Response<proto::GetMaterialsListResponse> = self
            .inner
            .unary(Request::new(()), path, ProstCodec::default())
            .await?;
        Ok(response.into_inner().names)
    }

    pub async fn get_material(&mut self, name: &str) -> Result<proto::AdditiveMaterial, Status> {
        self.ready().await?;
        let request = proto::GetMaterialRequest {
            name: name.to_string(),
        };
        let path = PathAndQuery::from_static(GET_MATERIAL);
        let response = self
            .inner
            .unary(Request::new(request), path, ProstCodec::default())
            .await?;
        Ok(response.into_inner())
    }

    pub async fn about(&mut self) -> Result<HashMap<String, String>, Status> {
        self.ready().await?;
        let path = PathAndQuery::from_static(ABOUT);
        let response: tonic::Response<proto::AboutResponse> = self
            .inner
            .unary(Request::new(()), path, ProstCodec::default())
            .await?;
        Ok(response.into_inner().metadata)
    }
}

/// Split `content` into upload messages of at most [`UPLOAD_CHUNK_SIZE`]
/// bytes. An empty file still yields one message so the server learns its
/// name.
pub fn upload_chunks(name: &str, content: &[u8]) -> Vec<proto::UploadFileRequest> {
    let total_size = content.len() as i64;
    let message = |content: &[u8]| proto::UploadFileRequest {
        name: name.to_string(),
        total_size,
        content: content.to_vec(),
    };
    if content.is_empty() {
        return vec![message(content)];
    }
    content.chunks(UPLOAD_CHUNK_SIZE).map(message).collect()
}
